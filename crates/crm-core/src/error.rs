//! Error types for the contact directory.

use thiserror::Error;

/// Result type alias using the directory's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for contact directory operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A create was attempted while no organization is selected.
    #[error("No organization selected")]
    NoActiveTenant,

    /// The remote store rejected or failed an update.
    #[error("Remote update failed: {0}")]
    RemoteUpdate(String),

    /// The load source could not produce the tenant's contacts.
    #[error("Load failed: {0}")]
    LoadFailure(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
