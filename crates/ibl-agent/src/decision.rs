//! Caller-facing options.
//!
//! An option is either a bare decision value (single-attribute agents) or an
//! explicit attribute-value mapping. Canonicalisation against the agent's
//! declared schema happens inside the agent, where schema errors are
//! reported.

use std::fmt;

use serde::Serialize;

use ibl_memory::Value;

/// Attribute name synthesised for agents declaring no attributes.
pub const DECISION_ATTRIBUTE: &str = "_decision";
/// Attribute name under which outcomes are stored.
pub const UTILITY_ATTRIBUTE: &str = "_utility";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decision {
    /// A bare value, for agents with exactly one attribute.
    Value(Value),
    /// Explicit attribute-value pairs, for multi-attribute agents.
    Attributes(Vec<(String, Value)>),
}

impl Decision {
    pub fn value(v: impl Into<Value>) -> Self {
        Decision::Value(v.into())
    }

    /// Build an attribute-mapped option.
    pub fn attributes<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Decision::Attributes(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Value> for Decision {
    fn from(v: Value) -> Self {
        Decision::Value(v)
    }
}

impl From<&str> for Decision {
    fn from(s: &str) -> Self {
        Decision::Value(Value::from(s))
    }
}

impl From<String> for Decision {
    fn from(s: String) -> Self {
        Decision::Value(Value::from(s))
    }
}

impl From<i64> for Decision {
    fn from(i: i64) -> Self {
        Decision::Value(Value::from(i))
    }
}

impl From<i32> for Decision {
    fn from(i: i32) -> Self {
        Decision::Value(Value::from(i))
    }
}

impl From<f64> for Decision {
    fn from(f: f64) -> Self {
        Decision::Value(Value::from(f))
    }
}

impl From<bool> for Decision {
    fn from(b: bool) -> Self {
        Decision::Value(Value::from(b))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Value(v) => write!(f, "{v}"),
            Decision::Attributes(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
