//! Network-related constants.

/// Default Barbican endpoint (devstack layout).
pub const DEFAULT_KEYMANAGER_ENDPOINT: &str = "http://127.0.0.1:9311";

/// Default per-request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
