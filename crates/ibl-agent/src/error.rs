use thiserror::Error;

use ibl_memory::MemoryError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("option {0} matches no instances and no default utility is set")]
    NoData(String),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
