//! The agent controller.
//!
//! Ties attributes, parameters, the clock, the instance store and the RNG to
//! the choose/respond state machine. The clock ticks exactly twice per
//! decision cycle: once entering `choose` (before any activation is
//! computed) and once entering `respond` (before the response chunk is
//! recorded), so every stored reference time is unique to the call that
//! wrote it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use ibl_memory::{
    activation, blend, probe_match, ChunkSnapshot, InstanceStore, MemoryError, Parameters,
    ProbeMatch, Time, Value,
};

use crate::config::AgentConfig;
use crate::decision::{Decision, DECISION_ATTRIBUTE, UTILITY_ATTRIBUTE};
use crate::delayed::DelayedResponse;
use crate::details::{render_trace, ChoiceDetails, InstanceDetail, OptionDetails};
use crate::error::{AgentError, Result};

static AGENT_SEQ: AtomicU64 = AtomicU64::new(1);

fn generated_name() -> String {
    format!("agent-{}", AGENT_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// A decision awaiting its outcome.
struct Pending {
    slots: Vec<(String, Value)>,
    expectation: f64,
    chosen_at: Time,
}

/// Agent-side record of an outstanding delayed response.
struct DelayedRecord {
    slots: Vec<(String, Value)>,
    time: Time,
    provisional: f64,
    resolved: bool,
    outcome: Option<f64>,
}

pub struct Agent {
    name: String,
    attributes: Vec<String>,
    /// The schema was declared empty and `_decision` synthesised.
    synthetic: bool,
    params: Parameters,
    default_utility: Option<f64>,
    default_utility_populates: bool,
    store: InstanceStore,
    time: Time,
    rng: StdRng,
    pending: Option<Pending>,
    delayed: HashMap<u64, DelayedRecord>,
    next_delayed: u64,
    details_enabled: bool,
    trace_enabled: bool,
    log: Vec<ChoiceDetails>,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Agent> {
        let mut seen = std::collections::HashSet::new();
        for attr in &config.attributes {
            if attr.is_empty() {
                return Err(AgentError::Schema("empty attribute name".to_string()));
            }
            if attr == DECISION_ATTRIBUTE || attr == UTILITY_ATTRIBUTE {
                return Err(AgentError::Schema(format!(
                    "attribute name {attr:?} is reserved"
                )));
            }
            if !seen.insert(attr.clone()) {
                return Err(AgentError::Schema(format!(
                    "attribute {attr:?} declared twice"
                )));
            }
        }
        let params = Parameters {
            noise: config.noise,
            decay: config.decay,
            temperature: config.temperature,
            mismatch_penalty: config.mismatch_penalty,
            optimized_learning: config.optimized_learning,
        };
        params.validate()?;
        if let Some(d) = config.default_utility {
            if !d.is_finite() {
                return Err(MemoryError::NonFiniteUtility(d).into());
            }
        }
        let synthetic = config.attributes.is_empty();
        let attributes = if synthetic {
            vec![DECISION_ATTRIBUTE.to_string()]
        } else {
            config.attributes
        };
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Agent {
            name: config.name.unwrap_or_else(generated_name),
            attributes,
            synthetic,
            store: InstanceStore::new(params.optimized_learning),
            params,
            default_utility: config.default_utility,
            default_utility_populates: config.default_utility_populates,
            time: 0,
            rng,
            pending: None,
            delayed: HashMap::new(),
            next_delayed: 0,
            details_enabled: false,
            trace_enabled: false,
            log: Vec::new(),
        })
    }

    // ─────────────────────────────────────────────
    // Choose / respond
    // ─────────────────────────────────────────────

    /// Pick among `options` by blended value, ties broken uniformly at
    /// random. The chosen option must be answered with one of the respond
    /// methods before the next `choose`.
    pub fn choose(&mut self, options: &[Decision]) -> Result<Decision> {
        if options.is_empty() {
            return Err(AgentError::Protocol(
                "choose requires at least one option".to_string(),
            ));
        }
        if self.pending.is_some() {
            return Err(AgentError::Protocol(
                "a response is pending; respond before choosing again".to_string(),
            ));
        }
        let probes: Vec<Vec<(String, Value)>> = options
            .iter()
            .map(|o| self.canonicalize(o))
            .collect::<Result<_>>()?;
        let temperature = self.params.blending_temperature()?;

        // An option nobody remembers can only be scored by the default
        // utility. Checked before anything mutates.
        if self.default_utility.is_none() {
            for (option, probe) in options.iter().zip(&probes) {
                let matched = self.store.iter().any(|c| {
                    probe_match(c.slots(), probe, self.params.mismatch_penalty)
                        != ProbeMatch::Excluded
                });
                if !matched {
                    return Err(AgentError::NoData(option.to_string()));
                }
            }
        }

        self.time += 1;
        let now = self.time;
        self.store.seal();

        let keep_details = self.details_enabled || self.trace_enabled;
        let mut blended = Vec::with_capacity(options.len());
        let mut details: Vec<OptionDetails> = Vec::new();
        for (option, probe) in options.iter().zip(&probes) {
            let mut scored: Vec<(f64, f64)> = Vec::new();
            let mut rows: Vec<InstanceDetail> = Vec::new();
            for chunk in self.store.iter() {
                let Some(a) = activation(chunk, probe, &self.params, now, &mut self.rng) else {
                    continue;
                };
                scored.push((a.total, chunk.utility()));
                if keep_details {
                    let snap = chunk.snapshot();
                    rows.push(InstanceDetail {
                        chunk_id: snap.id,
                        utility: snap.utility,
                        created_at: snap.created_at,
                        references: snap.references,
                        base_activation: a.base,
                        activation_noise: a.noise,
                        mismatch: a.mismatch,
                        activation: a.total,
                        retrieval_probability: 0.0, // filled after blending
                    });
                }
            }
            let (value, defaulted) = match blend(&scored, temperature) {
                Some(b) => {
                    for (row, p) in rows.iter_mut().zip(&b.probabilities) {
                        row.retrieval_probability = *p;
                    }
                    (b.value, false)
                }
                None => {
                    let Some(d) = self.default_utility else {
                        return Err(AgentError::NoData(option.to_string()));
                    };
                    if self.default_utility_populates {
                        self.store.insert(probe.clone(), d, now)?;
                    }
                    (d, true)
                }
            };
            blended.push(value);
            if keep_details {
                details.push(OptionDetails {
                    option: option.clone(),
                    blended_value: value,
                    defaulted,
                    instances: rows,
                });
            }
        }

        let best = blended.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let tied: Vec<usize> = (0..blended.len())
            .filter(|&i| blended[i] == best)
            .collect();
        let chosen = if tied.len() == 1 {
            tied[0]
        } else {
            tied[self.rng.gen_range(0..tied.len())]
        };

        self.pending = Some(Pending {
            slots: probes[chosen].clone(),
            expectation: blended[chosen],
            chosen_at: now,
        });
        debug!(
            agent = %self.name,
            time = now,
            options = options.len(),
            chosen = %options[chosen],
            blended_value = blended[chosen],
            "choose"
        );
        if keep_details {
            let record = ChoiceDetails {
                time: now,
                options: details,
                chosen,
            };
            if self.trace_enabled {
                println!("{}", render_trace(&self.name, &record));
            }
            if self.details_enabled {
                self.log.push(record);
            }
        }
        Ok(options[chosen].clone())
    }

    /// `choose` immediately followed by a deferred respond: the expectation
    /// is recorded as a provisional instance and the handle resolves it
    /// later.
    pub fn choose_deferred(&mut self, options: &[Decision]) -> Result<(Decision, DelayedResponse)> {
        let chosen = self.choose(options)?;
        let handle = self.respond_later()?;
        Ok((chosen, handle))
    }

    /// Resolve the pending choice with its observed outcome.
    pub fn respond(&mut self, outcome: f64) -> Result<()> {
        if !outcome.is_finite() {
            return Err(MemoryError::NonFiniteUtility(outcome).into());
        }
        let pending = self.take_pending()?;
        self.time += 1;
        let chosen_at = pending.chosen_at;
        self.store.insert(pending.slots, outcome, self.time)?;
        debug!(agent = %self.name, time = self.time, chosen_at, outcome, "respond");
        Ok(())
    }

    /// Defer the outcome: the choose-time expectation is learned as a
    /// provisional instance, to be replaced when the returned handle is
    /// updated.
    pub fn respond_later(&mut self) -> Result<DelayedResponse> {
        let expectation = self.pending_expectation()?;
        self.defer(expectation, None)
    }

    /// Learn `outcome` now but keep it overridable: the task may deliver a
    /// correction later through the returned handle.
    pub fn respond_provisional(&mut self, outcome: f64) -> Result<DelayedResponse> {
        if !outcome.is_finite() {
            return Err(MemoryError::NonFiniteUtility(outcome).into());
        }
        self.pending_expectation()?;
        self.defer(outcome, Some(outcome))
    }

    fn pending_expectation(&self) -> Result<f64> {
        match &self.pending {
            Some(p) => Ok(p.expectation),
            None => Err(AgentError::Protocol(
                "respond called with no choice pending".to_string(),
            )),
        }
    }

    fn defer(&mut self, provisional: f64, outcome: Option<f64>) -> Result<DelayedResponse> {
        if self.params.optimized_learning {
            return Err(AgentError::Protocol(
                "delayed responses need full reference histories; disable optimized learning"
                    .to_string(),
            ));
        }
        let pending = self.take_pending()?;
        self.time += 1;
        let t = self.time;
        self.store.insert(pending.slots.clone(), provisional, t)?;
        let id = self.next_delayed;
        self.next_delayed += 1;
        self.delayed.insert(
            id,
            DelayedRecord {
                slots: pending.slots,
                time: t,
                provisional,
                resolved: false,
                outcome,
            },
        );
        debug!(agent = %self.name, time = t, chosen_at = pending.chosen_at, provisional, "respond deferred");
        Ok(DelayedResponse {
            id,
            expectation: pending.expectation,
            outcome,
            resolved: false,
        })
    }

    fn take_pending(&mut self) -> Result<Pending> {
        self.pending.take().ok_or_else(|| {
            AgentError::Protocol("respond called with no choice pending".to_string())
        })
    }

    /// Replace a provisional instance with the real outcome, preserving the
    /// original response time. Called through [`DelayedResponse::update`].
    pub(crate) fn resolve_delayed(&mut self, id: u64, outcome: f64) -> Result<()> {
        if !outcome.is_finite() {
            return Err(MemoryError::NonFiniteUtility(outcome).into());
        }
        let record = self.delayed.get_mut(&id).ok_or_else(|| {
            AgentError::Protocol(
                "unknown delayed response; the agent may have been reset".to_string(),
            )
        })?;
        if record.resolved {
            return match record.outcome {
                Some(prev) if prev == outcome => Ok(()),
                _ => Err(AgentError::Protocol(format!(
                    "delayed response already resolved with {:?}, cannot change it to {outcome}",
                    record.outcome
                ))),
            };
        }
        if outcome != record.provisional {
            self.store
                .remove_reference(&record.slots, record.provisional, record.time)?;
            self.store.insert(record.slots.clone(), outcome, record.time)?;
        }
        record.resolved = true;
        record.outcome = Some(outcome);
        debug!(agent = %self.name, time = record.time, outcome, "delayed response resolved");
        Ok(())
    }

    // ─────────────────────────────────────────────
    // Prepopulation
    // ─────────────────────────────────────────────

    /// Seed one instance per option at the current clock (time 0 before the
    /// first decision cycle).
    pub fn populate(&mut self, outcome: f64, options: &[Decision]) -> Result<()> {
        let t = self.time;
        self.populate_at(outcome, options, t)
    }

    /// Seed instances at an explicit time, which must not lie in the future.
    pub fn populate_at(&mut self, outcome: f64, options: &[Decision], time: Time) -> Result<()> {
        if time > self.time {
            return Err(MemoryError::FutureReference {
                time,
                now: self.time,
            }
            .into());
        }
        if !outcome.is_finite() {
            return Err(MemoryError::NonFiniteUtility(outcome).into());
        }
        for option in options {
            let slots = self.canonicalize(option)?;
            self.store.insert(slots, outcome, time)?;
        }
        debug!(agent = %self.name, time, outcome, count = options.len(), "populate");
        Ok(())
    }

    // ─────────────────────────────────────────────
    // Introspection and lifecycle
    // ─────────────────────────────────────────────

    /// Forget everything (or everything but the prepopulated instances),
    /// drop pending and delayed state, return the clock to 0.
    pub fn reset(&mut self, preserve_prepopulated: bool) {
        self.pending = None;
        self.delayed.clear();
        self.time = 0;
        self.store.clear(preserve_prepopulated);
        self.log.clear();
        debug!(agent = %self.name, preserve_prepopulated, "reset");
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared attribute names (the synthetic one for empty schemas).
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn time(&self) -> Time {
        self.time
    }

    /// Snapshots of every stored chunk, in insertion order.
    pub fn instances(&self) -> Vec<ChunkSnapshot> {
        self.store.snapshots()
    }

    pub fn set_details(&mut self, on: bool) {
        self.details_enabled = on;
    }

    pub fn set_trace(&mut self, on: bool) {
        self.trace_enabled = on;
    }

    /// Structured per-choice records accumulated while `details` was on.
    pub fn choice_log(&self) -> &[ChoiceDetails] {
        &self.log
    }

    // ─────────────────────────────────────────────
    // Parameters
    // ─────────────────────────────────────────────

    pub fn noise(&self) -> f64 {
        self.params.noise
    }

    pub fn set_noise(&mut self, noise: f64) -> Result<()> {
        self.update_params(|p| p.noise = noise)
    }

    pub fn decay(&self) -> f64 {
        self.params.decay
    }

    pub fn set_decay(&mut self, decay: f64) -> Result<()> {
        self.update_params(|p| p.decay = decay)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.params.temperature
    }

    pub fn set_temperature(&mut self, temperature: Option<f64>) -> Result<()> {
        self.update_params(|p| p.temperature = temperature)
    }

    pub fn mismatch_penalty(&self) -> Option<f64> {
        self.params.mismatch_penalty
    }

    pub fn set_mismatch_penalty(&mut self, mu: Option<f64>) -> Result<()> {
        self.update_params(|p| p.mismatch_penalty = mu)
    }

    pub fn default_utility(&self) -> Option<f64> {
        self.default_utility
    }

    pub fn set_default_utility(&mut self, utility: Option<f64>) -> Result<()> {
        if let Some(u) = utility {
            if !u.is_finite() {
                return Err(MemoryError::NonFiniteUtility(u).into());
            }
        }
        self.default_utility = utility;
        Ok(())
    }

    pub fn default_utility_populates(&self) -> bool {
        self.default_utility_populates
    }

    pub fn set_default_utility_populates(&mut self, on: bool) {
        self.default_utility_populates = on;
    }

    pub fn optimized_learning(&self) -> bool {
        self.params.optimized_learning
    }

    /// Only legal while the store is empty: histories are never collapsed or
    /// invented after the fact.
    pub fn set_optimized_learning(&mut self, on: bool) -> Result<()> {
        let mut p = self.params.clone();
        p.optimized_learning = on;
        p.validate()?;
        self.store.set_optimized_learning(on)?;
        self.params = p;
        Ok(())
    }

    fn update_params(&mut self, f: impl FnOnce(&mut Parameters)) -> Result<()> {
        let mut p = self.params.clone();
        f(&mut p);
        p.validate()?;
        self.params = p;
        Ok(())
    }

    // ─────────────────────────────────────────────
    // Schema
    // ─────────────────────────────────────────────

    /// Canonicalise an option into (name, value) pairs in declared order.
    fn canonicalize(&self, option: &Decision) -> Result<Vec<(String, Value)>> {
        match option {
            Decision::Value(v) => {
                if self.attributes.len() == 1 {
                    Ok(vec![(self.attributes[0].clone(), v.clone())])
                } else {
                    Err(AgentError::Schema(format!(
                        "bare value option needs a single-attribute agent, {} declares {}",
                        self.name,
                        self.attributes.len()
                    )))
                }
            }
            Decision::Attributes(pairs) => {
                if self.synthetic {
                    return Err(AgentError::Schema(format!(
                        "{} declares no attributes; options must be bare values",
                        self.name
                    )));
                }
                for (name, _) in pairs {
                    if !self.attributes.iter().any(|a| a == name) {
                        return Err(AgentError::Schema(format!(
                            "unknown attribute {name:?} in option"
                        )));
                    }
                }
                let mut slots = Vec::with_capacity(self.attributes.len());
                for attr in &self.attributes {
                    let mut values = pairs.iter().filter(|(name, _)| name == attr);
                    let (_, value) = values.next().ok_or_else(|| {
                        AgentError::Schema(format!("option is missing attribute {attr:?}"))
                    })?;
                    if values.next().is_some() {
                        return Err(AgentError::Schema(format!(
                            "attribute {attr:?} supplied twice in option"
                        )));
                    }
                    slots.push((attr.clone(), value.clone()));
                }
                Ok(slots)
            }
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("time", &self.time)
            .field("instances", &self.store.len())
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}
