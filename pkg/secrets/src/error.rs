use pkg_keymanager::ApiError;
use thiserror::Error;

/// Failures of [`SecretManager`](crate::SecretManager) operations.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No secret carries the requested name.
    #[error("secret '{name}' not found")]
    NotFound { name: String },

    /// The name matched more than one secret; never resolved automatically.
    #[error("secret name '{name}' is ambiguous: {count} matches")]
    MultipleResults { name: String, count: usize },

    #[error("could not parse secret reference '{0}'")]
    MalformedReference(String),

    #[error("operation cancelled")]
    Cancelled,

    /// Any other failure reported by the key manager, unchanged.
    #[error(transparent)]
    Remote(ApiError),
}

impl From<ApiError> for SecretError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Cancelled => SecretError::Cancelled,
            other => SecretError::Remote(other),
        }
    }
}

impl SecretError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SecretError::NotFound { .. })
    }
}
