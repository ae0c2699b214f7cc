//! Barbican secret attributes used when creating secrets.

/// Encryption algorithm recorded on every created secret.
pub const SECRET_ALGORITHM: &str = "aes";

/// Block cipher mode recorded on every created secret.
pub const SECRET_MODE: &str = "cbc";

/// Key length in bits recorded on every created secret.
pub const SECRET_BIT_LENGTH: u32 = 256;

/// Payloads are always sent base64-encoded.
pub const PAYLOAD_CONTENT_ENCODING: &str = "base64";

/// Content type used when the caller does not pick one (PKCS#12 bundles, raw keys).
pub const DEFAULT_PAYLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Versioned collection path for secrets, relative to the endpoint.
pub const SECRETS_PATH: &str = "v1/secrets";

/// Header carrying the Keystone token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
