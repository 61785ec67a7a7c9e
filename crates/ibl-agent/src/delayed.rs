//! Delayed response handles.
//!
//! A `DelayedResponse` stands for feedback the task has not delivered yet.
//! The agent stays authoritative for all memory mutation: the handle only
//! carries the identity of the agent-side record plus its own view of the
//! resolution state, and `update` routes through the agent that issued it.

use crate::agent::Agent;
use crate::error::{AgentError, Result};

#[derive(Debug)]
pub struct DelayedResponse {
    pub(crate) id: u64,
    pub(crate) expectation: f64,
    pub(crate) outcome: Option<f64>,
    pub(crate) resolved: bool,
}

impl DelayedResponse {
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// The blended value computed at choose time, fixed at creation. Until
    /// resolution this (or the provisional outcome) is what the agent
    /// learned.
    pub fn expectation(&self) -> f64 {
        self.expectation
    }

    /// The outcome the response currently carries: `None` until resolved or
    /// provisionally supplied.
    pub fn outcome(&self) -> Option<f64> {
        self.outcome
    }

    /// Resolve with the real outcome. The provisional chunk's reference at
    /// the original response time moves to a chunk carrying `outcome`, at
    /// that same time.
    ///
    /// Calling again with the identical outcome is a no-op; a different
    /// outcome after resolution is a protocol error.
    pub fn update(&mut self, agent: &mut Agent, outcome: f64) -> Result<()> {
        if self.resolved {
            return match self.outcome {
                Some(prev) if prev == outcome => Ok(()),
                _ => Err(AgentError::Protocol(format!(
                    "delayed response already resolved with {:?}, cannot change it to {outcome}",
                    self.outcome
                ))),
            };
        }
        agent.resolve_delayed(self.id, outcome)?;
        self.outcome = Some(outcome);
        self.resolved = true;
        Ok(())
    }
}
