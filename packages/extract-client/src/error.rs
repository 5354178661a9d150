//! Typed errors for the extract client.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Incomplete clauses are
//! never errors; they are dropped during normalization.

use thiserror::Error;

/// Errors that can occur while searching or running extracts.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Transport failure (connection refused, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the search server
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Submission request failed, so no job was started
    #[error("extract submission failed: {0}")]
    SubmissionFailed(String),

    /// Server reported the extract job as failed
    #[error("extract {id} failed")]
    JobFailed { id: String },

    /// Poll budget exhausted before the job reached a terminal state
    #[error("extract {id} still running after {polls} status polls")]
    PollLimitExceeded { id: String, polls: u32 },

    /// A job is already being tracked and has not finished
    #[error("an extract is already in progress")]
    JobInProgress,

    /// Unrecognized clause attribute name
    #[error("unknown clause field: {0}")]
    UnknownClauseField(String),

    /// Saved filter store failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for extract client operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
