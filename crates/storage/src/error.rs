//! Error types for storage operations.

use thiserror::Error;

use crate::types::Generation;

/// Errors that can occur during storage operations.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Object generation not found in the bucket.
    #[error("Object not found: {name}#{generation}")]
    NotFound { name: String, generation: Generation },

    /// Access denied.
    #[error("Access denied to {name}: {message}")]
    AccessDenied { name: String, message: String },

    /// Size mismatch (corruption or incomplete transfer).
    #[error("Size mismatch for {name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    /// Network error.
    #[error("Network error: {message}")]
    NetworkError { message: String, retryable: bool },

    /// Local I/O error while streaming object content.
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl StorageError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::NetworkError { retryable, .. } => *retryable,
            StorageError::NotFound { .. } => false,
            StorageError::AccessDenied { .. } => false,
            StorageError::SizeMismatch { .. } => false,
            StorageError::IoError { .. } => false,
            StorageError::InvalidConfig { .. } => false,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError {
            message: err.to_string(),
        }
    }
}
