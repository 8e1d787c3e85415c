//! Write-back caching proxy for a single versioned remote object.
//!
//! An [`ObjectProxy`] gives callers file-like random access (read-at-offset,
//! write-at-offset, truncate) over an object whose true home is a bucket
//! that only supports whole-object creation of immutable generations.
//! Content is materialized into a local scratch file on first access;
//! writes stay local until [`ObjectProxy::sync`] creates a new generation.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: ObjectProxy (locking, materialization, sync, note_latest)
//! Layer 1: Primitives (Bucket; private state enum and scratch file)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use rusty_objproxy::ObjectProxy;
//! use rusty_objproxy_common::CancelToken;
//! use rusty_objproxy_storage::MemoryBucket;
//!
//! let proxy = ObjectProxy::new(Arc::new(MemoryBucket::new("bucket")), "f");
//! proxy.write_at(b"AB", 0).await?;
//! let record = proxy.sync(&CancelToken::new()).await?;
//! ```
//!
//! The scratch file and state enum stay internal to the proxy:
//!
//! ```compile_fail
//! use rusty_objproxy::scratch::ScratchFile;
//! ```

pub mod error;
pub mod options;
pub mod proxy;
mod scratch;
mod state;

pub use error::ProxyError;
pub use options::{ProxyOptions, TimeoutOptions};
pub use proxy::ObjectProxy;
