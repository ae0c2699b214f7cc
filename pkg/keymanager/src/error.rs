use reqwest::StatusCode;
use thiserror::Error;

/// Failures reported by the key-manager client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered 404 for the addressed resource.
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("key manager returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("key manager request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid key manager url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("key manager request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}
