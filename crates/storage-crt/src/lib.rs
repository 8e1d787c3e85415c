//! AWS SDK S3 backend for rusty-objproxy storage.
//!
//! This crate provides a `Bucket` implementation over a versioned S3 bucket
//! using the AWS SDK for Rust. S3 version ids serve as generation ids, so
//! the bucket must have versioning enabled.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use rusty_objproxy::ObjectProxy;
//! use rusty_objproxy_storage::StorageSettings;
//! use rusty_objproxy_storage_crt::CrtBucket;
//!
//! let settings = StorageSettings::default().with_region("us-east-1");
//! let bucket = CrtBucket::new(settings, "my-versioned-bucket").await?;
//!
//! let proxy = ObjectProxy::new(Arc::new(bucket), "reports/latest.csv");
//! ```

mod client;
mod error;

pub use client::CrtBucket;
pub use error::CrtError;
