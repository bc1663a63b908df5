use thiserror::Error;

use crate::sim::Family;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting '{field}': {reason}")]
    InvalidSettings { field: String, reason: String },

    #[error("Failed to load {family:?} asset for slot {slot}: {reason}")]
    AssetLoad {
        family: Family,
        slot: usize,
        reason: String,
    },
}

impl RunnerError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type RunnerResult<T> = Result<T, RunnerError>;
