//! Memory-level parameters.

use crate::error::{MemoryError, Result};

pub const DEFAULT_NOISE: f64 = 0.25;
pub const DEFAULT_DECAY: f64 = 0.5;

/// Parameters governing activation and blending.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Scale of the logistic activation noise (≥ 0).
    pub noise: f64,
    /// Power-law forgetting exponent (≥ 0; < 1 under optimized learning).
    pub decay: f64,
    /// Blending temperature τ (> 0). `None` means `noise · √2`.
    pub temperature: Option<f64>,
    /// Partial-matching scale μ (≥ 0). `None` disables partial matching
    /// entirely: every attribute then requires exact equality.
    pub mismatch_penalty: Option<f64>,
    /// Keep only (creation time, count) per chunk instead of full reference
    /// histories.
    pub optimized_learning: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            noise: DEFAULT_NOISE,
            decay: DEFAULT_DECAY,
            temperature: None,
            mismatch_penalty: None,
            optimized_learning: false,
        }
    }
}

impl Parameters {
    /// Check every static constraint, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(MemoryError::InvalidParameter {
                name: "noise",
                reason: format!("must be a finite number ≥ 0, got {}", self.noise),
            });
        }
        if !self.decay.is_finite() || self.decay < 0.0 {
            return Err(MemoryError::InvalidParameter {
                name: "decay",
                reason: format!("must be a finite number ≥ 0, got {}", self.decay),
            });
        }
        if self.optimized_learning && self.decay >= 1.0 {
            return Err(MemoryError::InvalidParameter {
                name: "decay",
                reason: format!("must be < 1 under optimized learning, got {}", self.decay),
            });
        }
        if let Some(t) = self.temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err(MemoryError::InvalidParameter {
                    name: "temperature",
                    reason: format!("must be a finite number > 0, got {t}"),
                });
            }
        }
        if let Some(m) = self.mismatch_penalty {
            if !m.is_finite() || m < 0.0 {
                return Err(MemoryError::InvalidParameter {
                    name: "mismatch_penalty",
                    reason: format!("must be a finite number ≥ 0, got {m}"),
                });
            }
        }
        Ok(())
    }

    /// Effective blending temperature.
    ///
    /// The implicit default `noise · √2` is only diagnosable once both
    /// parameters are known, so a zero noise with no explicit temperature is
    /// reported here rather than at set time.
    pub fn blending_temperature(&self) -> Result<f64> {
        let t = self
            .temperature
            .unwrap_or(self.noise * std::f64::consts::SQRT_2);
        if t > 0.0 {
            Ok(t)
        } else {
            Err(MemoryError::InvalidParameter {
                name: "temperature",
                reason: "effective temperature is not positive; set temperature explicitly \
                         when noise is 0"
                    .to_string(),
            })
        }
    }
}
