//! Name-oriented helpers over the key-manager secret API.

pub mod error;
pub mod manager;

pub use error::SecretError;
pub use manager::{SecretManager, parse_secret_id};
