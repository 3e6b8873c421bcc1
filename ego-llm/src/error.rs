//! LLM error types.

use ego_core::CollaboratorError;
use thiserror::Error;

/// Errors that can occur talking to the Ollama backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be interpreted.
    #[error("Failed to parse LLM response: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// The backend is unreachable or not configured.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// All retry attempts exhausted.
    #[error("All LLM retry attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// The final attempt's error.
        last_error: String,
    },
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

impl From<LlmError> for CollaboratorError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(ms) => CollaboratorError::Timeout(ms),
            LlmError::Parse(msg) => CollaboratorError::Malformed(msg),
            other => CollaboratorError::Unavailable(other.to_string()),
        }
    }
}
