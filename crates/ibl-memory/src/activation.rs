//! Activation arithmetic.
//!
//! A chunk's activation against a probe at time `t` combines three terms:
//!
//! ```text
//! A_i = B_i + ε_i + P_i
//!
//! B_i = ln( Σ_j (t − t_ij)^(−d) )                      base level
//!     = ln( n_i / (1 − d) ) − d·ln(t − t_creation)     optimized learning
//! ε_i = s · ln( u / (1 − u) ),  u ~ Uniform(0, 1)      logistic noise
//! P_i = μ · Σ_k (S_ik − 1)                             partial matching
//! ```
//!
//! Terms with non-positive age are skipped; a chunk with no remaining terms
//! is excluded from retrieval. A fresh noise sample is drawn for every
//! (chunk, query) pair and never reused.

use rand::Rng;
use serde::Serialize;

use crate::chunk::{Chunk, ReferenceHistory, Time};
use crate::params::Parameters;
use crate::similarity::similarity;
use crate::value::Value;

/// Per-chunk activation components, kept for the details log.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActivationBreakdown {
    pub base: f64,
    pub noise: f64,
    /// `None` when no partial-matchable attribute participated.
    pub mismatch: Option<f64>,
    pub total: f64,
}

/// Outcome of matching a chunk's slots against a probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeMatch {
    /// The chunk participates; carries the mismatch correction when partial
    /// matching applied to at least one attribute.
    Eligible(Option<f64>),
    /// The chunk fails an exact-match requirement.
    Excluded,
}

/// Match `slots` against `probe` (both in canonical attribute order).
///
/// Attributes with no registered similarity require equality. With a
/// registered similarity the behaviour depends on the mismatch penalty:
/// absent, equality is still required; present (zero included), the chunk is
/// never excluded on that attribute and accrues `μ · (S − 1)`.
pub fn probe_match(
    slots: &[(String, Value)],
    probe: &[(String, Value)],
    mismatch_penalty: Option<f64>,
) -> ProbeMatch {
    debug_assert_eq!(slots.len(), probe.len());
    let mut penalty: Option<f64> = None;
    for ((name, held), (probe_name, wanted)) in slots.iter().zip(probe) {
        debug_assert_eq!(name, probe_name);
        match (similarity(name), mismatch_penalty) {
            (Some(sim), Some(mu)) => {
                let s = sim.score(held, wanted);
                *penalty.get_or_insert(0.0) += mu * (s - 1.0);
            }
            _ => {
                if held != wanted {
                    return ProbeMatch::Excluded;
                }
            }
        }
    }
    ProbeMatch::Eligible(penalty)
}

/// Base-level activation of a chunk at time `now`, or `None` when no
/// positive-age reference remains.
pub fn base_level(chunk: &Chunk, now: Time, decay: f64) -> Option<f64> {
    match chunk.history() {
        ReferenceHistory::Times(refs) => {
            let mut sum = 0.0;
            let mut terms = 0usize;
            for &t in refs {
                if t < now {
                    sum += ((now - t) as f64).powf(-decay);
                    terms += 1;
                }
            }
            if terms == 0 {
                None
            } else {
                Some(sum.ln())
            }
        }
        ReferenceHistory::Count(n) => {
            if *n == 0 || chunk.created_at() >= now {
                return None;
            }
            let life = (now - chunk.created_at()) as f64;
            Some((*n as f64 / (1.0 - decay)).ln() - decay * life.ln())
        }
    }
}

/// One logistic noise sample with the given scale.
///
/// The uniform draw is clamped into the open unit interval so the transform
/// never produces an infinity. Exactly 0.0 when the scale is 0.
pub fn logistic_noise<R: Rng + ?Sized>(scale: f64, rng: &mut R) -> f64 {
    if scale == 0.0 {
        return 0.0;
    }
    let u = rng.gen::<f64>().clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    scale * (u / (1.0 - u)).ln()
}

/// Full activation of `chunk` against `probe` at time `now`.
///
/// `None` means the chunk does not participate in retrieval for this query,
/// either because an exact-match attribute differs or because it has no
/// positive-age reference. Noise is drawn only for participating chunks.
pub fn activation<R: Rng + ?Sized>(
    chunk: &Chunk,
    probe: &[(String, Value)],
    params: &Parameters,
    now: Time,
    rng: &mut R,
) -> Option<ActivationBreakdown> {
    let mismatch = match probe_match(chunk.slots(), probe, params.mismatch_penalty) {
        ProbeMatch::Excluded => return None,
        ProbeMatch::Eligible(m) => m,
    };
    let base = base_level(chunk, now, params.decay)?;
    let noise = logistic_noise(params.noise, rng);
    Some(ActivationBreakdown {
        base,
        noise,
        mismatch,
        total: base + noise + mismatch.unwrap_or(0.0),
    })
}
