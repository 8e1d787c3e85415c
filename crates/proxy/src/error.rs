//! Error types for the proxy crate.

use std::time::Duration;

use rusty_objproxy_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during proxy operations.
///
/// Every error leaves the proxy in a consistent state from which the
/// operation can be retried. Invariant breaches are not errors; they panic.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Malformed generation record passed to `note_latest`.
    #[error("Invalid object record: {0}")]
    Validation(String),

    /// Scratch file allocation or I/O failed.
    #[error("Scratch file error: {0}")]
    Scratch(#[from] std::io::Error),

    /// Bucket fetch or create failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Offset or length not representable as a signed file offset.
    #[error("Illegal offset: {0}")]
    InvalidOffset(u64),

    /// The caller cancelled a network-facing operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// A network-facing operation exceeded its configured timeout.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl ProxyError {
    /// Check if retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProxyError::Storage(err) => err.is_retryable(),
            ProxyError::Timeout { .. } => true,
            ProxyError::Cancelled => true,
            ProxyError::Validation(_) => false,
            ProxyError::Scratch(_) => false,
            ProxyError::InvalidOffset(_) => false,
        }
    }
}
