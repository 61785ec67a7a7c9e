//! Agent configuration.

use ibl_memory::{DEFAULT_DECAY, DEFAULT_NOISE};

/// Everything an agent is constructed with. Field defaults match the
/// conventional model parameters; a `seed` makes the whole agent
/// reproducible (noise and tie-breaking both draw from the agent's RNG).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Display name used in logs and traces. `None` auto-generates
    /// `agent-1`, `agent-2`, …
    pub name: Option<String>,
    /// Declared attribute names, in order. An empty list declares a
    /// single-attribute agent whose options are bare decision values.
    pub attributes: Vec<String>,
    /// Scale of the logistic activation noise (≥ 0).
    pub noise: f64,
    /// Power-law forgetting exponent (≥ 0; < 1 under optimized learning).
    pub decay: f64,
    /// Blending temperature (> 0). `None` means `noise · √2`.
    pub temperature: Option<f64>,
    /// Partial-matching scale (≥ 0). `None` requires exact matches even for
    /// attributes with a registered similarity.
    pub mismatch_penalty: Option<f64>,
    /// Blended value assumed for an option with no matching instances.
    pub default_utility: Option<f64>,
    /// Whether using the default utility also records a real instance.
    pub default_utility_populates: bool,
    /// Keep only (creation time, count) per chunk.
    pub optimized_learning: bool,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: None,
            attributes: Vec::new(),
            noise: DEFAULT_NOISE,
            decay: DEFAULT_DECAY,
            temperature: None,
            mismatch_penalty: None,
            default_utility: None,
            default_utility_populates: true,
            optimized_learning: false,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_attributes(attributes: &[&str]) -> Self {
        Self {
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }
}
