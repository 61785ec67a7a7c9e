use thiserror::Error;

use crate::chunk::Time;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("utility must be a finite number, got {0}")]
    NonFiniteUtility(f64),

    #[error("reference time {time} is later than the current clock {now}")]
    FutureReference { time: Time, now: Time },

    #[error("optimized learning can only be toggled while the store is empty")]
    OptimizedLearningNotEmpty,

    #[error("chunk {id} has no reference at time {time}")]
    MissingReference { id: u64, time: Time },

    #[error("no chunk stored for the given attributes and utility")]
    UnknownChunk,

    #[error("unsupported JSON value: {0}")]
    UnsupportedJson(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
