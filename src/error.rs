//! Error types for filedrop.

use thiserror::Error;

/// Common error type for filedrop.
#[derive(Error, Debug)]
pub enum FiledropError {
    /// A required setting is absent.
    ///
    /// Only raised while validating configuration at startup.
    #[error("missing configuration: {0}")]
    ConfigMissing(String),

    /// A setting is present but unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The storage backend failed to enumerate or open files.
    #[error("backend error: {0}")]
    Backend(String),

    /// The requested file does not exist in the backend.
    #[error("{0} not found")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),
}

/// Result type alias for filedrop operations.
pub type Result<T> = std::result::Result<T, FiledropError>;
