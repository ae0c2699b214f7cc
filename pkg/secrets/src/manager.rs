use std::sync::Arc;

use pkg_constants::metrics::{OP_CREATE, OP_DELETE, OP_LIST, RESOURCE_SECRET};
use pkg_keymanager::KeyManager;
use pkg_metrics::{MetricContext, MetricsRegistry};
use pkg_types::secret::{CreateSecretRequest, ListSecretsQuery, Secret, SecretType};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::SecretError;

/// Name-based secret operations on top of a [`KeyManager`].
///
/// Holds no secret state of its own: every lookup goes to the service.
/// Each remote call is measured under resource `secret` with operation
/// `list`, `create` or `delete`.
pub struct SecretManager<C> {
    client: C,
    metrics: Arc<MetricsRegistry>,
}

impl<C: KeyManager> SecretManager<C> {
    pub fn new(client: C, metrics: Arc<MetricsRegistry>) -> Self {
        metrics.register_api_metrics();
        Self { client, metrics }
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Return the reference of the secret called `name`, creating it if absent.
    ///
    /// An existing secret is reused as is; its type and payload are not compared
    /// with the requested ones.
    pub async fn ensure_secret(
        &self,
        name: &str,
        secret_type: &str,
        payload: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SecretError> {
        match self.get_secret(name, cancel).await {
            Ok(secret) => {
                debug!("Secret {} already exists at {}", name, secret.secret_ref);
                Ok(secret.secret_ref)
            }
            Err(SecretError::NotFound { .. }) => {
                self.create_secret(name, secret_type, payload, cancel).await
            }
            Err(e) => Err(e),
        }
    }

    /// The single secret named exactly `name`.
    pub async fn get_secret(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Secret, SecretError> {
        let mut secrets = self.list(&ListSecretsQuery::by_name(name), cancel).await?;

        match secrets.len() {
            0 => Err(SecretError::NotFound {
                name: name.to_string(),
            }),
            1 => Ok(secrets.remove(0)),
            count => Err(SecretError::MultipleResults {
                name: name.to_string(),
                count,
            }),
        }
    }

    /// Create an opaque AES-256/CBC secret and return its reference.
    /// `secret_type` is the payload content type; `payload` must already be base64.
    pub async fn create_secret(
        &self,
        name: &str,
        secret_type: &str,
        payload: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SecretError> {
        let request = CreateSecretRequest::opaque(name, secret_type, payload);
        let mc = MetricContext::new(&self.metrics, RESOURCE_SECRET, OP_CREATE);
        let secret_ref = mc
            .observe(self.client.create_secret(&request, cancel).await)?;
        info!("Created secret {} at {}", name, secret_ref);
        Ok(secret_ref)
    }

    /// Delete every opaque secret whose name contains `part_name`.
    ///
    /// Secrets that disappear before their delete lands are skipped. Any other
    /// failure stops the batch at that point: secrets already deleted stay
    /// deleted and the remaining matches are left in place. Returns how many
    /// secrets this call removed.
    pub async fn delete_secrets(
        &self,
        part_name: &str,
        cancel: &CancellationToken,
    ) -> Result<usize, SecretError> {
        let secrets = self
            .list(&ListSecretsQuery::by_type(SecretType::Opaque), cancel)
            .await?;

        let mut deleted = 0;
        for secret in secrets.iter().filter(|s| s.name.contains(part_name)) {
            if cancel.is_cancelled() {
                return Err(SecretError::Cancelled);
            }
            let id = parse_secret_id(&secret.secret_ref)?;

            let mc = MetricContext::new(&self.metrics, RESOURCE_SECRET, OP_DELETE);
            match mc.observe(self.client.delete_secret(id, cancel).await) {
                Ok(()) => {
                    info!("Deleted secret {} ({})", secret.name, id);
                    deleted += 1;
                }
                Err(e) if e.is_not_found() => {
                    debug!("Secret {} ({}) already gone", secret.name, id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(deleted)
    }

    async fn list(
        &self,
        query: &ListSecretsQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Secret>, SecretError> {
        let mc = MetricContext::new(&self.metrics, RESOURCE_SECRET, OP_LIST);
        Ok(mc.observe(self.client.list_secrets(query, cancel).await)?)
    }
}

/// Extract the secret ID, the last path segment of a secret reference.
pub fn parse_secret_id(reference: &str) -> Result<&str, SecretError> {
    match reference.rsplit_once('/') {
        Some((_, id)) if !id.is_empty() => Ok(id),
        _ => Err(SecretError::MalformedReference(reference.to_string())),
    }
}
