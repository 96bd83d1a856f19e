// src/error.rs
//! Domain errors for the fetch loop and the coordinator.

use crate::ingest::types::RetryReason;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed summary payload: {0}")]
    Parse(String),

    #[error("no acceptable article after {attempts} attempts (last: {last})")]
    Exhausted { attempts: u32, last: RetryReason },
}

impl FetchError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Parse(_) => "parse",
            FetchError::Exhausted { .. } => "exhausted",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Failure signal handed to the coordinator for one refresh cycle.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch Wikipedia data: {source}")]
pub struct UpdateFailed {
    #[from]
    pub source: FetchError,
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
