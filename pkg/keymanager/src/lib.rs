//! Thin Barbican (OpenStack key-manager) v1 client.
//!
//! [`KeyManager`] is the seam consumed by higher layers; [`BarbicanClient`]
//! implements it over HTTP, following pagination links and honouring the
//! caller's cancellation token on every request.

pub mod client;
pub mod error;

use async_trait::async_trait;
use pkg_types::secret::{CreateSecretRequest, ListSecretsQuery, Secret};
use tokio_util::sync::CancellationToken;

pub use client::{BarbicanClient, ClientConfig};
pub use error::ApiError;

/// Primitive secret operations of the key-manager service.
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// Every secret matching `query`, across all pages.
    async fn list_secrets(
        &self,
        query: &ListSecretsQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Secret>, ApiError>;

    /// Create a secret and return the reference assigned by the service.
    async fn create_secret(
        &self,
        request: &CreateSecretRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError>;

    /// Delete a secret by ID. A missing secret yields [`ApiError::NotFound`].
    async fn delete_secret(&self, id: &str, cancel: &CancellationToken) -> Result<(), ApiError>;
}
