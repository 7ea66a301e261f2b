//! Common error types for EVS

use thiserror::Error;

/// Common result type for EVS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across EVS crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON document could not be parsed or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document failed boundary validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
