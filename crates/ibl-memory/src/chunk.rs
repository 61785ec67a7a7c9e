//! Chunk model: an attribute tuple plus utility, with temporal bookkeeping.
//!
//! Two observations with identical attributes and identical utility collapse
//! into one chunk; what distinguishes repeated observations is the reference
//! history. Under optimized learning the history is collapsed to a bare count
//! next to the creation time.

use serde::Serialize;

use crate::value::Value;

/// Clock value. The agent's clock starts at 0 and ticks by 1.
pub type Time = u64;

#[derive(Debug, Clone)]
pub enum ReferenceHistory {
    /// Full reference times, non-decreasing.
    Times(Vec<Time>),
    /// Optimized learning: occurrence count only.
    Count(u64),
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub(crate) id: u64,
    pub(crate) slots: Vec<(String, Value)>,
    pub(crate) utility: f64,
    pub(crate) created_at: Time,
    pub(crate) history: ReferenceHistory,
    /// How many leading references were recorded during the prepopulation
    /// phase (before the store was sealed by the first choose/respond).
    pub(crate) seeded: u64,
}

impl Chunk {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn slots(&self) -> &[(String, Value)] {
        &self.slots
    }

    pub fn utility(&self) -> f64 {
        self.utility
    }

    pub fn created_at(&self) -> Time {
        self.created_at
    }

    pub fn history(&self) -> &ReferenceHistory {
        &self.history
    }

    pub fn reference_count(&self) -> u64 {
        match &self.history {
            ReferenceHistory::Times(ts) => ts.len() as u64,
            ReferenceHistory::Count(n) => *n,
        }
    }

    /// Record one more occurrence at `t`. Keeps the reference list sorted;
    /// delayed-feedback resolution may graft a time before the latest one.
    pub(crate) fn touch(&mut self, t: Time, prepopulation: bool) {
        match &mut self.history {
            ReferenceHistory::Times(ts) => {
                let at = ts.partition_point(|&r| r <= t);
                ts.insert(at, t);
            }
            ReferenceHistory::Count(n) => *n += 1,
        }
        if prepopulation {
            self.seeded += 1;
        }
    }

    pub fn snapshot(&self) -> ChunkSnapshot {
        ChunkSnapshot {
            id: self.id,
            slots: self.slots.clone(),
            utility: self.utility,
            created_at: self.created_at,
            references: match &self.history {
                ReferenceHistory::Times(ts) => ReferenceSnapshot::Times(ts.clone()),
                ReferenceHistory::Count(n) => ReferenceSnapshot::Count(*n),
            },
        }
    }
}

/// Read-only view of a chunk for introspection and logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSnapshot {
    pub id: u64,
    pub slots: Vec<(String, Value)>,
    pub utility: f64,
    pub created_at: Time,
    pub references: ReferenceSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReferenceSnapshot {
    Times(Vec<Time>),
    Count(u64),
}

impl ReferenceSnapshot {
    pub fn count(&self) -> u64 {
        match self {
            ReferenceSnapshot::Times(ts) => ts.len() as u64,
            ReferenceSnapshot::Count(n) => *n,
        }
    }
}
