//! Storage traits/interfaces for versioned object operations.

use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::StorageError;
use crate::types::{Generation, ObjectRecord};

/// Byte stream returned when fetching object content.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Versioned bucket operations - implemented by each backend.
#[async_trait]
pub trait Bucket: Send + Sync {
    /// Name of the bucket.
    fn name(&self) -> &str;

    /// Fetch the content of one exact generation of an object.
    ///
    /// # Arguments
    /// * `name` - Object name
    /// * `generation` - Generation to read; never "latest"
    ///
    /// # Returns
    /// A stream over the full content, or `StorageError::NotFound` if that
    /// generation does not exist.
    async fn fetch_object(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<ObjectReader, StorageError>;

    /// Create a new generation of an object from the given content.
    ///
    /// Unconditionally replaces whatever generation is current.
    ///
    /// # Arguments
    /// * `name` - Object name
    /// * `contents` - Full content of the new generation
    ///
    /// # Returns
    /// The record of the newly created generation.
    async fn create_object(
        &self,
        name: &str,
        contents: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<ObjectRecord, StorageError>;
}
