//! Common error types for Folio

use thiserror::Error;

/// Common result type for Folio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Folio crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No identifier is left above the largest one in use
    #[error("Identifier space exhausted: largest id is {0}")]
    IdsExhausted(i64),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
