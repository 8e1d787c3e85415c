//! Storage abstraction for versioned remote objects.
//!
//! This crate defines the backend collaborator consumed by the object proxy:
//! a bucket that can fetch the exact content of one immutable generation of
//! an object and atomically create a new generation. It supports multiple
//! backends:
//!
//! - **CRT Backend** - Versioned Amazon S3 buckets (see `rusty-objproxy-storage-crt`)
//! - **Memory Backend** - In-process [`MemoryBucket`] for embedding and tests

mod error;
mod memory;
mod traits;
mod types;

pub use error::StorageError;
pub use memory::MemoryBucket;
pub use traits::{Bucket, ObjectReader};
pub use types::{AwsCredentials, Generation, ObjectRecord, StorageSettings};
