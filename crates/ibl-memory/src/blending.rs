//! Blending: activation-weighted utility averaging.
//!
//! ```text
//! w_i = exp(A_i / τ)
//! p_i = w_i / Σ_j w_j
//! BV  = Σ_i p_i · u_i
//! ```
//!
//! Computed with the maximum activation subtracted before exponentiating so
//! extreme activations neither overflow nor underflow to an all-zero weight
//! vector.

/// A blended value together with the per-chunk retrieval probabilities, in
/// the order the `(activation, utility)` pairs were given.
#[derive(Debug, Clone)]
pub struct Blend {
    pub value: f64,
    pub probabilities: Vec<f64>,
}

/// Blend `(activation, utility)` pairs at temperature `τ > 0`.
///
/// Returns `None` for an empty match set; the caller decides how an
/// unmatched option is handled.
pub fn blend(scored: &[(f64, f64)], temperature: f64) -> Option<Blend> {
    if scored.is_empty() {
        return None;
    }
    let max_a = scored
        .iter()
        .map(|(a, _)| *a)
        .fold(f64::NEG_INFINITY, f64::max);
    let mut weights = Vec::with_capacity(scored.len());
    let mut total = 0.0;
    for (a, _) in scored {
        let w = ((a - max_a) / temperature).exp();
        total += w;
        weights.push(w);
    }
    // total ≥ 1: the maximal activation contributes exp(0)
    let mut value = 0.0;
    let probabilities: Vec<f64> = weights
        .into_iter()
        .zip(scored)
        .map(|(w, (_, u))| {
            let p = w / total;
            value += p * u;
            p
        })
        .collect();
    Some(Blend {
        value,
        probabilities,
    })
}
