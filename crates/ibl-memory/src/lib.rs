//! # ibl-memory
//!
//! Declarative-memory substrate for instance-based learning models.
//!
//! Holds the pieces an agent layer composes into a choose/respond loop:
//!
//! - **Chunks and the instance store** — observations keyed by
//!   (attributes, utility), merged across recurrences, enumerated in
//!   insertion order.
//! - **Activation** — power-law base level (exact or optimized), logistic
//!   noise, partial-matching correction.
//! - **Blending** — softmax-weighted utility averaging with log-sum-exp
//!   stabilisation.
//! - **Similarity registry** — process-wide attribute-name → similarity-fn
//!   mapping underlying partial matching.
//!
//! All state here is per-store and single-threaded; only the similarity
//! registry is shared across the process.

pub mod activation;
pub mod blending;
pub mod chunk;
pub mod error;
pub mod params;
pub mod similarity;
pub mod store;
pub mod value;

pub use activation::{
    activation, base_level, logistic_noise, probe_match, ActivationBreakdown, ProbeMatch,
};
pub use blending::{blend, Blend};
pub use chunk::{Chunk, ChunkSnapshot, ReferenceHistory, ReferenceSnapshot, Time};
pub use error::{MemoryError, Result};
pub use params::{Parameters, DEFAULT_DECAY, DEFAULT_NOISE};
pub use similarity::{
    clear_similarity, linear_similarity, linear_similarity_between, quadratic_similarity,
    quadratic_similarity_between, set_similarity, set_similarity_weighted, similarity, Similarity,
    SimilarityFn,
};
pub use store::InstanceStore;
pub use value::Value;
