use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use pkg_constants::keymanager::{AUTH_TOKEN_HEADER, SECRETS_PATH};
use pkg_constants::network::{DEFAULT_KEYMANAGER_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS};
use pkg_types::secret::{
    CreateSecretRequest, CreateSecretResponse, ListSecretsQuery, Secret, SecretPage,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{ApiError, KeyManager};

/// Connection settings for [`BarbicanClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root, e.g. `https://barbican.example.com:9311`.
    pub endpoint: String,
    /// Keystone token sent as `X-Auth-Token`; omitted when `None`.
    pub token: Option<String>,
    pub timeout: Duration,
    /// Accept self-signed certificates (development clouds only).
    pub insecure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_KEYMANAGER_ENDPOINT.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            insecure: false,
        }
    }
}

/// HTTP client for the Barbican v1 secrets API.
#[derive(Clone)]
pub struct BarbicanClient {
    http: reqwest::Client,
    secrets_url: Url,
    token: Option<String>,
}

impl BarbicanClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;
        let secrets_url = secrets_url(&config.endpoint)?;
        debug!("Barbican secrets collection at {}", secrets_url);
        Ok(Self {
            http,
            secrets_url,
            token: config.token,
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.header(AUTH_TOKEN_HEADER, token),
            None => builder,
        }
    }

    fn secret_url(&self, id: &str) -> Result<Url, ApiError> {
        let mut url = self.secrets_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl {
                url: self.secrets_url.to_string(),
                reason: "url cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl KeyManager for BarbicanClient {
    async fn list_secrets(
        &self,
        query: &ListSecretsQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Secret>, ApiError> {
        let mut url = self.secrets_url.clone();
        let filters = query.to_pairs();
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &filters {
                pairs.append_pair(key, value);
            }
        }

        let mut secrets = Vec::new();
        loop {
            debug!("GET {}", url);
            let page: SecretPage = cancellable(cancel, async {
                let resp = self.request(Method::GET, url.clone()).send().await?;
                let resp = check_status(resp, "secrets").await?;
                Ok::<SecretPage, ApiError>(resp.json().await?)
            })
            .await?;
            secrets.extend(page.secrets);

            match page.next {
                Some(next) => {
                    let next_url = parse_url(&next)?;
                    // Some deployments echo the current page on the last request.
                    if next_url == url {
                        break;
                    }
                    url = next_url;
                }
                None => break,
            }
        }
        Ok(secrets)
    }

    async fn create_secret(
        &self,
        request: &CreateSecretRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        debug!("POST {} name={}", self.secrets_url, request.name);
        let created: CreateSecretResponse = cancellable(cancel, async {
            let resp = self
                .request(Method::POST, self.secrets_url.clone())
                .json(request)
                .send()
                .await?;
            let resp = check_status(resp, &request.name).await?;
            Ok::<CreateSecretResponse, ApiError>(resp.json().await?)
        })
        .await?;
        Ok(created.secret_ref)
    }

    async fn delete_secret(&self, id: &str, cancel: &CancellationToken) -> Result<(), ApiError> {
        let url = self.secret_url(id)?;
        debug!("DELETE {}", url);
        cancellable(cancel, async {
            let resp = self.request(Method::DELETE, url).send().await?;
            check_status(resp, id).await?;
            Ok::<(), ApiError>(())
        })
        .await
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        res = fut => res,
    }
}

async fn check_status(resp: Response, resource: &str) -> Result<Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(resource.to_string()));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status { status, body });
    }
    Ok(resp)
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    Url::parse(raw).map_err(|e| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve the secrets collection from a service root, with or without `/v1`.
fn secrets_url(endpoint: &str) -> Result<Url, ApiError> {
    let base = endpoint.trim_end_matches('/');
    let raw = match base.strip_suffix("/v1") {
        Some(root) => format!("{}/{}", root, SECRETS_PATH),
        None => format!("{}/{}", base, SECRETS_PATH),
    };
    parse_url(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_url_accepts_versioned_and_bare_roots() {
        for endpoint in [
            "http://barbican:9311",
            "http://barbican:9311/",
            "http://barbican:9311/v1",
            "http://barbican:9311/v1/",
        ] {
            assert_eq!(
                secrets_url(endpoint).unwrap().as_str(),
                "http://barbican:9311/v1/secrets"
            );
        }
    }

    #[test]
    fn secrets_url_keeps_path_prefix() {
        assert_eq!(
            secrets_url("https://cloud.example.com/key-manager").unwrap().as_str(),
            "https://cloud.example.com/key-manager/v1/secrets"
        );
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(matches!(
            secrets_url("not a url"),
            Err(ApiError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn secret_url_escapes_id() {
        let client = BarbicanClient::new(ClientConfig::default()).unwrap();
        assert_eq!(
            client.secret_url("abc123").unwrap().as_str(),
            "http://127.0.0.1:9311/v1/secrets/abc123"
        );
        assert_eq!(
            client.secret_url("a b").unwrap().as_str(),
            "http://127.0.0.1:9311/v1/secrets/a%20b"
        );
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res: Result<(), ApiError> =
            cancellable(&cancel, std::future::pending::<Result<(), ApiError>>()).await;
        assert!(matches!(res, Err(ApiError::Cancelled)));
    }
}
