//! Process-wide similarity registry.
//!
//! Similarity is an intrinsic property of an attribute's semantics, not of
//! any one agent, so the registry is a process-wide singleton consulted by
//! the activation engine at query time. Typical usage registers functions
//! once during setup; runtime mutation while agents are choosing is the
//! caller's responsibility to avoid.
//!
//! A similarity function maps a value pair to `[0, 1]`, 1 meaning identical
//! by the function's own lights. Results are clamped at the call site.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::value::Value;

pub type SimilarityFn = dyn Fn(&Value, &Value) -> f64 + Send + Sync;

/// A registered similarity: the function plus its declared weight.
///
/// The weight is carried as registry metadata and reported through
/// [`Similarity::weight`]; the partial-matching correction itself is
/// unweighted.
#[derive(Clone)]
pub struct Similarity {
    func: Arc<SimilarityFn>,
    weight: f64,
}

impl Similarity {
    /// Score a value pair, clamped into `[0, 1]`.
    pub fn score(&self, a: &Value, b: &Value) -> f64 {
        (self.func)(a, b).clamp(0.0, 1.0)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl fmt::Debug for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Similarity")
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

static REGISTRY: Lazy<DashMap<String, Similarity>> = Lazy::new(DashMap::new);

/// Register `func` for every attribute in `attributes`, with weight 1.
pub fn set_similarity<F>(attributes: &[&str], func: F)
where
    F: Fn(&Value, &Value) -> f64 + Send + Sync + 'static,
{
    set_similarity_weighted(attributes, func, 1.0);
}

/// Register `func` for every attribute in `attributes` with an explicit
/// declared weight.
pub fn set_similarity_weighted<F>(attributes: &[&str], func: F, weight: f64)
where
    F: Fn(&Value, &Value) -> f64 + Send + Sync + 'static,
{
    let func: Arc<SimilarityFn> = Arc::new(func);
    for name in attributes {
        REGISTRY.insert(
            (*name).to_string(),
            Similarity {
                func: Arc::clone(&func),
                weight,
            },
        );
    }
}

/// Remove any similarity registered for the named attributes; they revert to
/// exact matching.
pub fn clear_similarity(attributes: &[&str]) {
    for name in attributes {
        REGISTRY.remove(*name);
    }
}

/// Look up the similarity registered for an attribute, if any.
pub fn similarity(attribute: &str) -> Option<Similarity> {
    REGISTRY.get(attribute).map(|entry| entry.value().clone())
}

// ─────────────────────────────────────────────
// Convenience factories
// ─────────────────────────────────────────────
//
// All factories treat non-numeric operands as exact-match-or-nothing.

fn numeric_pair(a: &Value, b: &Value) -> Option<(f64, f64)> {
    Some((a.as_f64()?, b.as_f64()?))
}

fn equality(a: &Value, b: &Value) -> f64 {
    if a == b {
        1.0
    } else {
        0.0
    }
}

/// `s(x, y) = 1 − |x − y| / max` on `[0, max]`.
pub fn linear_similarity(max: f64) -> impl Fn(&Value, &Value) -> f64 + Send + Sync + 'static {
    linear_similarity_between(0.0, max)
}

/// `s(x, y) = 1 − ((x − y) / max)²` on `[0, max]`.
pub fn quadratic_similarity(max: f64) -> impl Fn(&Value, &Value) -> f64 + Send + Sync + 'static {
    quadratic_similarity_between(0.0, max)
}

/// `s(x, y) = 1 − |x − y| / (hi − lo)` on `[lo, hi]`.
pub fn linear_similarity_between(
    lo: f64,
    hi: f64,
) -> impl Fn(&Value, &Value) -> f64 + Send + Sync + 'static {
    let span = hi - lo;
    move |a, b| match numeric_pair(a, b) {
        Some((x, y)) => 1.0 - (x - y).abs() / span,
        None => equality(a, b),
    }
}

/// `s(x, y) = 1 − ((x − y) / (hi − lo))²` on `[lo, hi]`.
pub fn quadratic_similarity_between(
    lo: f64,
    hi: f64,
) -> impl Fn(&Value, &Value) -> f64 + Send + Sync + 'static {
    let span = hi - lo;
    move |a, b| match numeric_pair(a, b) {
        Some((x, y)) => {
            let d = (x - y) / span;
            1.0 - d * d
        }
        None => equality(a, b),
    }
}
