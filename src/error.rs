//! Error types for mswp

use std::io;
use thiserror::Error;

/// Errors surfaced by the application shell (config, logging, terminal I/O).
///
/// Core triage operations never return these: collaborator failures are
/// absorbed at their boundary and caller contract violations panic.
#[derive(Debug, Error)]
pub enum MswpError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, MswpError>;
