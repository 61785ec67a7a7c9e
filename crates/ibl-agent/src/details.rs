//! Structured per-choice diagnostics.
//!
//! Built only when the `details` or `trace` toggle is on; normal execution
//! allocates none of this.

use serde::Serialize;

use ibl_memory::{ReferenceSnapshot, Time};

use crate::decision::Decision;

/// Everything one `choose` call considered.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceDetails {
    pub time: Time,
    pub options: Vec<OptionDetails>,
    /// Index into `options` of the selected one.
    pub chosen: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionDetails {
    pub option: Decision,
    pub blended_value: f64,
    /// True when the option had no matching instances and the default
    /// utility stood in.
    pub defaulted: bool,
    pub instances: Vec<InstanceDetail>,
}

/// One contributing chunk's activation record.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceDetail {
    pub chunk_id: u64,
    pub utility: f64,
    pub created_at: Time,
    pub references: ReferenceSnapshot,
    pub base_activation: f64,
    pub activation_noise: f64,
    pub mismatch: Option<f64>,
    pub activation: f64,
    pub retrieval_probability: f64,
}

fn render_references(r: &ReferenceSnapshot) -> String {
    match r {
        ReferenceSnapshot::Count(n) => format!("×{n}"),
        ReferenceSnapshot::Times(ts) if ts.len() <= 6 => format!("{ts:?}"),
        ReferenceSnapshot::Times(ts) => {
            let tail = &ts[ts.len() - 4..];
            format!("×{} [… {:?}]", ts.len(), tail)
        }
    }
}

/// Human-readable table for one choose call.
pub(crate) fn render_trace(agent: &str, d: &ChoiceDetails) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{agent} t={} chose {}\n",
        d.time, d.options[d.chosen].option
    ));
    out.push_str(&format!(
        "{:<18} {:>9}  {:>5} {:>7} {:<16} {:>8} {:>8} {:>8} {:>10} {:>7}\n",
        "option", "blended", "chunk", "created", "refs", "base", "noise", "mismatch", "activation",
        "p"
    ));
    for opt in &d.options {
        let label = opt.option.to_string();
        if opt.defaulted {
            out.push_str(&format!(
                "{:<18} {:>9.4}  (default utility)\n",
                label, opt.blended_value
            ));
            continue;
        }
        for (i, inst) in opt.instances.iter().enumerate() {
            let lead = if i == 0 { label.as_str() } else { "" };
            let bv = if i == 0 {
                format!("{:>9.4}", opt.blended_value)
            } else {
                " ".repeat(9)
            };
            out.push_str(&format!(
                "{:<18} {}  {:>5} {:>7} {:<16} {:>8.4} {:>8.4} {:>8} {:>10.4} {:>7.4}\n",
                lead,
                bv,
                inst.chunk_id,
                inst.created_at,
                render_references(&inst.references),
                inst.base_activation,
                inst.activation_noise,
                inst.mismatch
                    .map(|m| format!("{m:.4}"))
                    .unwrap_or_else(|| "-".to_string()),
                inst.activation,
                inst.retrieval_probability,
            ));
        }
    }
    out
}
