//! Error types for the portaldb document store.
//!
//! All write paths return `PortalDbResult<T>`. Read paths degrade to empty
//! results or `None` and log instead of returning these.

use thiserror::Error;

/// Unified error type for all portaldb operations.
#[derive(Debug, Error)]
pub enum PortalDbError {
    /// Backing store error (write refused, quota, corruption on write path)
    #[error("storage error: {0}")]
    Storage(String),

    /// sled embedded database error
    #[error("sled error: {source}")]
    Sled {
        #[from]
        source: sled::Error,
    },

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Document is not a JSON object or carries a malformed id
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Filter could not be parsed (e.g. `$or` is not an array)
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Index specification rejected
    #[error("invalid index on collection '{collection}': {reason}")]
    InvalidIndex { collection: String, reason: String },

    /// Entity-level validation failure in the facade
    #[error("validation failed for {entity}: {message}")]
    Validation { entity: String, message: String },

    /// Store was closed or never connected
    #[error("database '{0}' is not connected")]
    NotConnected(String),
}

/// Result type alias for all portaldb operations.
pub type PortalDbResult<T> = Result<T, PortalDbError>;

impl From<serde_json::Error> for PortalDbError {
    fn from(err: serde_json::Error) -> Self {
        PortalDbError::Serialization(err.to_string())
    }
}

impl PortalDbError {
    /// Shorthand for facade validation errors.
    pub fn validation(entity: &str, message: impl Into<String>) -> Self {
        PortalDbError::Validation {
            entity: entity.to_string(),
            message: message.into(),
        }
    }
}
