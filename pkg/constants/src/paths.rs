//! Filesystem path constants.

/// Default config file path for `barbicanctl`.
pub const DEFAULT_CONFIG: &str = "/etc/barbicanctl/config.yaml";
