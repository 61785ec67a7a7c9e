//! Instance store: every chunk an agent has accumulated.
//!
//! The store is logically a set keyed by (attribute values, utility), held in
//! insertion order so enumeration — and therefore tracing under a fixed RNG
//! seed — is reproducible. Inserting an already-known pair appends a
//! reference instead of creating a chunk.
//!
//! The store is *sealed* by the first non-prepopulation event (a choose or a
//! respond). References recorded before the seal are the prepopulation phase;
//! `clear(preserve_prepopulated)` keeps exactly those chunks, truncated back
//! to their prepopulation references.

use std::collections::HashMap;

use tracing::trace;

use crate::chunk::{Chunk, ChunkSnapshot, ReferenceHistory, Time};
use crate::error::{MemoryError, Result};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChunkKey {
    values: Vec<Value>,
    utility_bits: u64,
}

impl ChunkKey {
    fn new(slots: &[(String, Value)], utility: f64) -> Self {
        Self {
            values: slots.iter().map(|(_, v)| v.clone()).collect(),
            utility_bits: utility.to_bits(),
        }
    }
}

#[derive(Debug)]
pub struct InstanceStore {
    chunks: Vec<Chunk>,
    index: HashMap<ChunkKey, usize>,
    next_id: u64,
    optimized: bool,
    sealed: bool,
}

impl InstanceStore {
    pub fn new(optimized_learning: bool) -> Self {
        Self {
            chunks: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
            optimized: optimized_learning,
            sealed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn optimized_learning(&self) -> bool {
        self.optimized
    }

    /// Switch the history representation. Histories are never converted, so
    /// the switch is only legal while the store is empty.
    pub fn set_optimized_learning(&mut self, on: bool) -> Result<()> {
        if on != self.optimized && !self.is_empty() {
            return Err(MemoryError::OptimizedLearningNotEmpty);
        }
        self.optimized = on;
        Ok(())
    }

    /// Mark the end of the prepopulation phase. Idempotent.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Record an occurrence of (slots, utility) at time `t`, merging into an
    /// existing chunk when the pair is already known. Returns the chunk id.
    pub fn insert(&mut self, slots: Vec<(String, Value)>, utility: f64, t: Time) -> Result<u64> {
        if !utility.is_finite() {
            return Err(MemoryError::NonFiniteUtility(utility));
        }
        let key = ChunkKey::new(&slots, utility);
        let prepopulation = !self.sealed;
        if let Some(&at) = self.index.get(&key) {
            let chunk = &mut self.chunks[at];
            chunk.touch(t, prepopulation);
            trace!(id = chunk.id, time = t, "reference appended");
            return Ok(chunk.id);
        }
        let id = self.next_id;
        self.next_id += 1;
        let history = if self.optimized {
            ReferenceHistory::Count(1)
        } else {
            ReferenceHistory::Times(vec![t])
        };
        self.chunks.push(Chunk {
            id,
            slots,
            utility,
            created_at: t,
            history,
            seeded: if prepopulation { 1 } else { 0 },
        });
        self.index.insert(key, self.chunks.len() - 1);
        trace!(id, time = t, utility, "chunk created");
        Ok(id)
    }

    /// Remove the reference at time `t` from the chunk keyed by
    /// (slots, utility), deleting the chunk when that was its only
    /// reference. Used by delayed-feedback resolution; requires full
    /// reference histories.
    pub fn remove_reference(
        &mut self,
        slots: &[(String, Value)],
        utility: f64,
        t: Time,
    ) -> Result<()> {
        let key = ChunkKey::new(slots, utility);
        let at = *self.index.get(&key).ok_or(MemoryError::UnknownChunk)?;
        let chunk = &mut self.chunks[at];
        let id = chunk.id;
        match &mut chunk.history {
            ReferenceHistory::Times(refs) => {
                let pos = refs
                    .iter()
                    .position(|&r| r == t)
                    .ok_or(MemoryError::MissingReference { id, time: t })?;
                refs.remove(pos);
                if refs.is_empty() {
                    self.chunks.remove(at);
                    self.index.remove(&key);
                    for (i, c) in self.chunks.iter().enumerate().skip(at) {
                        self.index.insert(ChunkKey::new(&c.slots, c.utility), i);
                    }
                    trace!(id, time = t, "chunk removed with its last reference");
                }
            }
            ReferenceHistory::Count(_) => {
                return Err(MemoryError::MissingReference { id, time: t });
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Snapshots of every live chunk, in insertion order.
    pub fn snapshots(&self) -> Vec<ChunkSnapshot> {
        self.chunks.iter().map(Chunk::snapshot).collect()
    }

    /// Drop chunks. With `preserve_prepopulated`, chunks first observed
    /// during the prepopulation phase survive with their reference history
    /// truncated back to the prepopulation references; everything else goes.
    /// Either way the store is unsealed again.
    pub fn clear(&mut self, preserve_prepopulated: bool) {
        if preserve_prepopulated {
            self.chunks.retain_mut(|chunk| {
                if chunk.seeded == 0 {
                    return false;
                }
                match &mut chunk.history {
                    ReferenceHistory::Times(refs) => refs.truncate(chunk.seeded as usize),
                    ReferenceHistory::Count(n) => *n = chunk.seeded,
                }
                true
            });
        } else {
            self.chunks.clear();
        }
        self.index = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (ChunkKey::new(&c.slots, c.utility), i))
            .collect();
        self.sealed = false;
        trace!(remaining = self.chunks.len(), "store cleared");
    }
}
