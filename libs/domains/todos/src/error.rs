use thiserror::Error;

use crate::models::TodoId;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Todo not found: {0}")]
    NotFound(TodoId),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Remote service returned {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TodoResult<T> = Result<T, TodoError>;

impl TodoError {
    /// Failures caused by the caller's input rather than the environment
    pub fn is_validation(&self) -> bool {
        matches!(self, TodoError::Validation(_))
    }
}

impl From<reqwest::Error> for TodoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TodoError::Timeout(err.to_string())
        } else if err.is_decode() {
            TodoError::Serialization(err.to_string())
        } else {
            TodoError::Remote(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(err: serde_json::Error) -> Self {
        TodoError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for TodoError {
    fn from(err: std::io::Error) -> Self {
        TodoError::Storage(err.to_string())
    }
}

impl From<validator::ValidationErrors> for TodoError {
    fn from(err: validator::ValidationErrors) -> Self {
        TodoError::Validation(err.to_string())
    }
}
