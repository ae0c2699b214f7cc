//! Centralized constants for the Barbican secret helpers.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod keymanager;
pub mod metrics;
pub mod network;
pub mod paths;
