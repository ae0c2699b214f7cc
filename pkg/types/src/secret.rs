use chrono::NaiveDateTime;
use pkg_constants::keymanager::{
    PAYLOAD_CONTENT_ENCODING, SECRET_ALGORITHM, SECRET_BIT_LENGTH, SECRET_MODE,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Barbican's classification of what a secret holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretType {
    Symmetric,
    Public,
    Private,
    Passphrase,
    Certificate,
    /// Unstructured bytes; everything this workspace creates is opaque.
    #[default]
    Opaque,
}

impl SecretType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretType::Symmetric => "symmetric",
            SecretType::Public => "public",
            SecretType::Private => "private",
            SecretType::Passphrase => "passphrase",
            SecretType::Certificate => "certificate",
            SecretType::Opaque => "opaque",
        }
    }
}

impl std::fmt::Display for SecretType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secret metadata as returned by `GET /v1/secrets`.
/// The payload itself is never part of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Secret {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Full URL of the secret; the last path segment is its ID.
    pub secret_ref: String,
    #[serde(default)]
    pub secret_type: SecretType,
    /// MIME types keyed by role, usually just `default`.
    #[serde(default)]
    pub content_types: HashMap<String, String>,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub bit_length: Option<u32>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub updated: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub expiration: Option<NaiveDateTime>,
    #[serde(default)]
    pub creator_id: Option<String>,
}

/// Body of `POST /v1/secrets`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSecretRequest {
    pub name: String,
    pub algorithm: String,
    pub mode: String,
    pub bit_length: u32,
    pub payload: String,
    pub payload_content_type: String,
    pub payload_content_encoding: String,
    pub secret_type: SecretType,
}

impl CreateSecretRequest {
    /// Opaque AES-256/CBC secret carrying a base64 payload of `content_type`.
    pub fn opaque(name: &str, content_type: &str, payload: &str) -> Self {
        Self {
            name: name.to_string(),
            algorithm: SECRET_ALGORITHM.to_string(),
            mode: SECRET_MODE.to_string(),
            bit_length: SECRET_BIT_LENGTH,
            payload: payload.to_string(),
            payload_content_type: content_type.to_string(),
            payload_content_encoding: PAYLOAD_CONTENT_ENCODING.to_string(),
            secret_type: SecretType::Opaque,
        }
    }
}

/// Response of `POST /v1/secrets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSecretResponse {
    pub secret_ref: String,
}

/// One page of `GET /v1/secrets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretPage {
    #[serde(default)]
    pub secrets: Vec<Secret>,
    #[serde(default)]
    pub total: Option<u64>,
    /// Absolute URL of the following page, absent on the last one.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Server-side filters for a secret listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSecretsQuery {
    pub name: Option<String>,
    pub secret_type: Option<SecretType>,
}

impl ListSecretsQuery {
    pub fn by_name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            secret_type: None,
        }
    }

    pub fn by_type(secret_type: SecretType) -> Self {
        Self {
            name: None,
            secret_type: Some(secret_type),
        }
    }

    /// Query-string pairs in the order Barbican documents them.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        if let Some(secret_type) = self.secret_type {
            pairs.push(("secret_type", secret_type.to_string()));
        }
        pairs
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Barbican emits timestamps without a zone (`2024-01-02T03:04:05.678901`),
/// newer deployments sometimes append one.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, de::Error};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => s,
            _ => return Ok(None),
        };
        if let Ok(ts) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Some(ts));
        }
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| Some(ts.naive_utc()))
            .map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}
