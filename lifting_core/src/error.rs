//! Error types for the lifting_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lifting_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input rejected before it reached storage
    #[error("Validation error: {0}")]
    Validation(String),

    /// A value could not be parsed (dates, set arguments, set types)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Requested template does not exist in the store
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
}
