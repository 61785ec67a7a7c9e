//! # ibl-agent
//!
//! Instance-based learning agents for dynamic, repeated-choice tasks.
//!
//! An agent accumulates instances — (context, decision, outcome) records —
//! and, asked to select among candidate options, computes for each a blended
//! value weighting remembered outcomes by activation-derived retrieval
//! probability. Outcomes are fed back after each choice:
//!
//! ```
//! use ibl_agent::{Agent, AgentConfig, Decision};
//!
//! let mut agent = Agent::new(AgentConfig {
//!     default_utility: Some(10.0),
//!     seed: Some(1),
//!     ..AgentConfig::default()
//! })?;
//! for _ in 0..60 {
//!     let choice = agent.choose(&["safe".into(), "risky".into()])?;
//!     agent.respond(if choice == Decision::from("risky") { 5.0 } else { 0.0 })?;
//! }
//! # Ok::<(), ibl_agent::AgentError>(())
//! ```
//!
//! Feedback may also be deferred: [`Agent::choose_deferred`] hands back a
//! [`DelayedResponse`] that resolves the outcome later, replacing the
//! provisionally learned expectation while keeping the original response
//! time.
//!
//! The memory substrate (activation, blending, similarity registry) lives in
//! [`ibl_memory`] and is re-exported where callers need it.

pub mod agent;
pub mod config;
pub mod decision;
pub mod delayed;
pub mod details;
pub mod error;

pub use agent::Agent;
pub use config::AgentConfig;
pub use decision::{Decision, DECISION_ATTRIBUTE, UTILITY_ATTRIBUTE};
pub use delayed::DelayedResponse;
pub use details::{ChoiceDetails, InstanceDetail, OptionDetails};
pub use error::{AgentError, Result};

pub use ibl_memory::{
    clear_similarity, linear_similarity, linear_similarity_between, quadratic_similarity,
    quadratic_similarity_between, set_similarity, set_similarity_weighted, ChunkSnapshot,
    ReferenceSnapshot, Time, Value,
};
