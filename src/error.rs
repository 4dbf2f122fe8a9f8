//! Error types for reach-out.

use std::path::PathBuf;

/// Top-level error type for an outreach run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data source error: {0}")]
    Source(#[from] SourceError),

}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from a contact data source (remote spreadsheet or local file).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Data source {backend} is not configured: {reason}")]
    NotConfigured { backend: String, reason: String },

    #[error("Authentication failed for {backend}: {reason}")]
    Auth { backend: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection to {backend} failed: {reason}")]
    Connection { backend: String, reason: String },

    #[error("{backend} API returned {status}: {body}")]
    Api {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("Required column {0} is missing from the header row")]
    MissingColumn(String),

    #[error("Row {row} is out of range ({len} data rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Template loading and rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Template key {0:?} does not name a file in the template directory")]
    InvalidKey(String),

    #[error("Malformed template {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {0} is not supported")]
    Unsupported(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// Result type alias for an outreach run.
pub type Result<T> = std::result::Result<T, Error>;
