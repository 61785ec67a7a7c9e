//! Dynamic attribute values.
//!
//! Attribute values are arbitrary equatable data: a small tagged variant
//! covering the types task drivers actually pass. Equality and hashing are
//! total — floats compare by bit pattern, so a value can always serve as part
//! of a chunk's identity key. Note that `Int(1)` and `Float(1.0)` are
//! distinct values.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::{MemoryError, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Numeric view used by the similarity factories.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => state.write_u8(0),
            Value::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Value::Int(i) => {
                state.write_u8(2);
                i.hash(state);
            }
            Value::Float(f) => {
                state.write_u8(3);
                f.to_bits().hash(state);
            }
            Value::Str(s) => {
                state.write_u8(4);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Bridge for JSON-driven task drivers. Arrays and objects have no chunk-key
/// semantics and are rejected.
impl TryFrom<&serde_json::Value> for Value {
    type Error = MemoryError;

    fn try_from(v: &serde_json::Value) -> Result<Self> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(MemoryError::UnsupportedJson(n.to_string()))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            other => Err(MemoryError::UnsupportedJson(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(Value::from(1.5), Value::from(1.5));
        assert_ne!(Value::from(1.5), Value::from(1.5000001));
        // NaN keys are stable under bitwise comparison
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
    }

    #[test]
    fn int_and_float_are_distinct() {
        assert_ne!(Value::from(1i64), Value::from(1.0));
    }

    #[test]
    fn values_key_a_hash_map() {
        let mut m = HashMap::new();
        m.insert(Value::from("risky"), 1);
        m.insert(Value::from(0.72), 2);
        assert_eq!(m.get(&Value::from("risky")), Some(&1));
        assert_eq!(m.get(&Value::from(0.72)), Some(&2));
    }

    #[test]
    fn json_bridge_accepts_scalars() {
        let v = serde_json::json!("blue");
        assert_eq!(Value::try_from(&v).unwrap(), Value::from("blue"));
        let v = serde_json::json!(3);
        assert_eq!(Value::try_from(&v).unwrap(), Value::from(3i64));
        let v = serde_json::json!(0.25);
        assert_eq!(Value::try_from(&v).unwrap(), Value::from(0.25));
        let v = serde_json::json!(null);
        assert_eq!(Value::try_from(&v).unwrap(), Value::Null);
    }

    #[test]
    fn json_bridge_rejects_composites() {
        let v = serde_json::json!([1, 2]);
        assert!(Value::try_from(&v).is_err());
        let v = serde_json::json!({"a": 1});
        assert!(Value::try_from(&v).is_err());
    }

    #[test]
    fn display_renders_bare() {
        assert_eq!(Value::from("safe").to_string(), "safe");
        assert_eq!(Value::from(3i64).to_string(), "3");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
