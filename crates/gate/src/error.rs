//! Error types for the access gate.
//!
//! These cover startup only. The request path has a single visible failure (`401`) and never
//! produces a `GateError`.

use thiserror::Error;

/// Main error type for the gate.
#[derive(Error, Debug)]
pub enum GateError {
    /// Configuration errors (missing secret, invalid host, conflicting values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup errors (listener could not bind, site directory unusable)
    #[error("Startup error: {0}")]
    Startup(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
