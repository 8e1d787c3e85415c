//! Object proxy: random access reads and writes over a versioned object.
//!
//! Reads may be served from a local scratch file. Writes are buffered
//! locally until [`ObjectProxy::sync`] is called, at which time a new
//! generation of the object is created.
//!
//! All methods are safe for concurrent use. Each public operation holds the
//! proxy's lock for its full duration, including bucket calls made while
//! materializing or syncing, so operations are linearized and concurrent
//! in-process callers get the same guarantees as with POSIX files. A slow
//! fetch under one caller blocks other callers of the same proxy; distinct
//! proxies never contend.

use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rusty_objproxy_common::CancelToken;
use rusty_objproxy_storage::{Bucket, ObjectReader, ObjectRecord, StorageError};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::ProxyError;
use crate::options::ProxyOptions;
use crate::scratch::ScratchFile;
use crate::state::ProxyState;

/// Largest offset representable as a signed file offset.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// View on a remote object that allows random access reads and writes.
pub struct ObjectProxy {
    /// Bucket holding the object.
    bucket: Arc<dyn Bucket>,
    /// Name of the object. It might not exist in the bucket.
    name: String,
    /// Scratch directory and timeouts.
    options: ProxyOptions,
    /// Mutable state, guarded by one lock.
    state: Mutex<ProxyState>,
}

/// Lock guard that checks the state invariants on acquire and release.
struct InvariantGuard<'a> {
    guard: MutexGuard<'a, ProxyState>,
    name: &'a str,
}

impl Deref for InvariantGuard<'_> {
    type Target = ProxyState;

    fn deref(&self) -> &ProxyState {
        &self.guard
    }
}

impl DerefMut for InvariantGuard<'_> {
    fn deref_mut(&mut self) -> &mut ProxyState {
        &mut self.guard
    }
}

impl Drop for InvariantGuard<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.guard.check_invariants(self.name);
        }
    }
}

impl ObjectProxy {
    /// Create a proxy for the object with the given name.
    ///
    /// The remote object is assumed not to exist, so the local contents are
    /// empty and the proxy is dirty: the first sync creates the object. Use
    /// [`note_latest`](Self::note_latest) to branch from an existing
    /// generation instead.
    ///
    /// # Arguments
    /// * `bucket` - Bucket holding the object
    /// * `name` - Object name
    pub fn new(bucket: Arc<dyn Bucket>, name: impl Into<String>) -> Self {
        Self::with_options(bucket, name, ProxyOptions::default())
    }

    /// Create a proxy with custom options.
    ///
    /// # Arguments
    /// * `bucket` - Bucket holding the object
    /// * `name` - Object name
    /// * `options` - Scratch directory and timeouts
    pub fn with_options(
        bucket: Arc<dyn Bucket>,
        name: impl Into<String>,
        options: ProxyOptions,
    ) -> Self {
        Self {
            bucket,
            name: name.into(),
            options,
            state: Mutex::new(ProxyState::Empty),
        }
    }

    /// Name of the proxied object.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether local content may differ from the source generation.
    pub async fn is_dirty(&self) -> bool {
        self.lock().await.is_dirty()
    }

    /// Generation the local state is branched from, if any.
    pub async fn source(&self) -> Option<ObjectRecord> {
        self.lock().await.source().cloned()
    }

    /// Inform the proxy of the most recently observed generation of the
    /// object.
    ///
    /// Ignored if it is the generation the proxy is already branched from.
    /// Otherwise it becomes the definitive source of data: any local state,
    /// including local modifications, is discarded.
    ///
    /// # Arguments
    /// * `record` - Observed generation record
    ///
    /// # Errors
    /// `ProxyError::Validation` if the record has a negative size or names
    /// a different object. The proxy is unchanged in that case.
    pub async fn note_latest(&self, record: ObjectRecord) -> Result<(), ProxyError> {
        self.validate_record(&record)?;

        let mut state = self.lock().await;

        if state.source().map(|s| &s.generation) == Some(&record.generation) {
            return Ok(());
        }

        let was_dirty: bool = state.is_dirty();
        tracing::debug!(
            "Object {} superseded by generation {} ({} bytes)",
            self.name,
            record.generation,
            record.size
        );

        if let Some(scratch) = state.supersede(record) {
            if was_dirty {
                tracing::debug!("Discarding local modifications to {}", self.name);
            }
            let path = scratch.path().to_path_buf();
            if let Err(e) = scratch.discard().await {
                tracing::warn!("Failed to unlink scratch file {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    /// Current size in bytes of our view of the content.
    ///
    /// Never materializes and never touches the network.
    pub async fn size(&self) -> Result<u64, ProxyError> {
        let state = self.lock().await;

        // A local file is authoritative, then the source.
        if let Some(scratch) = state.scratch() {
            return Ok(scratch.len().await?);
        }

        match state.source() {
            Some(source) => Ok(source.size as u64),
            None => Ok(0),
        }
    }

    /// Random access read into our view of the content.
    ///
    /// May block on the network to materialize the source generation.
    ///
    /// # Arguments
    /// * `buf` - Buffer to fill
    /// * `offset` - Byte offset to read from
    ///
    /// # Returns
    /// Number of bytes read. Less than `buf.len()` only at end of content.
    pub async fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, ProxyError> {
        if offset > MAX_OFFSET {
            return Err(ProxyError::InvalidOffset(offset));
        }

        let mut state = self.lock().await;
        let scratch: &mut ScratchFile = self.ensure_scratch(&mut state).await?;
        Ok(scratch.read_at(buf, offset).await?)
    }

    /// Random access write into our view of the content.
    ///
    /// May block on the network to materialize the source generation. Not
    /// reflected remotely until a later [`sync`](Self::sync) succeeds.
    /// Writing past the end extends the content; any gap reads as zero.
    ///
    /// # Arguments
    /// * `buf` - Bytes to write
    /// * `offset` - Byte offset to write at
    ///
    /// # Returns
    /// Number of bytes written.
    pub async fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, ProxyError> {
        let end: u64 = offset
            .checked_add(buf.len() as u64)
            .filter(|end| *end <= MAX_OFFSET)
            .ok_or(ProxyError::InvalidOffset(offset))?;

        let mut state = self.lock().await;
        self.ensure_scratch(&mut state).await?;

        // Dirty before touching the file: a failed write may be partial.
        let scratch: &mut ScratchFile = state.mark_dirty();
        let written: usize = scratch.write_at(buf, offset).await?;

        tracing::trace!("Wrote {} bytes to {} ending at {}", written, self.name, end);
        Ok(written)
    }

    /// Truncate our view of the content to `new_size` bytes, zero-extending
    /// if it is larger than the current size.
    ///
    /// May block on the network to materialize the source generation. Not
    /// reflected remotely until a later [`sync`](Self::sync) succeeds.
    ///
    /// # Arguments
    /// * `new_size` - New content length in bytes
    pub async fn truncate(&self, new_size: u64) -> Result<(), ProxyError> {
        if new_size > MAX_OFFSET {
            return Err(ProxyError::InvalidOffset(new_size));
        }

        let mut state = self.lock().await;
        self.ensure_scratch(&mut state).await?;

        let scratch: &mut ScratchFile = state.mark_dirty();
        scratch.set_len(new_size).await?;
        Ok(())
    }

    /// Ensure the bucket holds a generation equal to our view of the
    /// content, returning its record.
    ///
    /// Does no work if the proxy is clean. Otherwise unconditionally creates
    /// a new generation, clobbering whatever the bucket currently holds.
    ///
    /// # Arguments
    /// * `cancel` - Aborts the create request when cancelled
    ///
    /// # Errors
    /// On any failure, including cancellation and timeout, the proxy stays
    /// dirty and branched from its previous source, so retrying is safe.
    pub async fn sync(&self, cancel: &CancelToken) -> Result<ObjectRecord, ProxyError> {
        let mut state = self.lock().await;

        if let ProxyState::Clean { source, .. } = &*state {
            return Ok(source.clone());
        }

        let create = async {
            let created: ObjectRecord = match &mut *state {
                ProxyState::Dirty { scratch, .. } => {
                    let contents = scratch.contents().await?;
                    self.bucket.create_object(&self.name, contents).await?
                }
                _ => {
                    // Never touched since construction: create an empty object.
                    self.bucket
                        .create_object(&self.name, &mut tokio::io::empty())
                        .await?
                }
            };
            Ok::<ObjectRecord, ProxyError>(created)
        };

        let created: ObjectRecord = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProxyError::Cancelled),
            result = with_timeout("create", self.options.timeouts.create, create) => result,
        }?;

        self.validate_record(&created)?;

        tracing::debug!(
            "Synced {} as generation {} ({} bytes)",
            self.name,
            created.generation,
            created.size
        );

        state.mark_synced(created.clone());
        Ok(created)
    }

    /// Acquire the state lock, checking invariants on acquire and release.
    async fn lock(&self) -> InvariantGuard<'_> {
        let guard: MutexGuard<'_, ProxyState> = self.state.lock().await;
        guard.check_invariants(&self.name);
        InvariantGuard {
            guard,
            name: &self.name,
        }
    }

    /// Reject records that could never be a generation of our object.
    fn validate_record(&self, record: &ObjectRecord) -> Result<(), ProxyError> {
        if record.size < 0 {
            return Err(ProxyError::Validation(format!(
                "Object contains negative size: {}",
                record.size
            )));
        }

        if record.name != self.name {
            return Err(ProxyError::Validation(format!(
                "Object name mismatch: {} vs. {}",
                record.name, self.name
            )));
        }

        Ok(())
    }

    /// Ensure a scratch file exists holding our current view of the content.
    ///
    /// Never changes whether the proxy is dirty. On failure no scratch file
    /// is kept, so a retry materializes from scratch.
    async fn ensure_scratch<'s>(
        &self,
        state: &'s mut ProxyState,
    ) -> Result<&'s mut ScratchFile, ProxyError> {
        if matches!(state, ProxyState::Empty) {
            // The object does not exist yet, so its content is empty.
            *state = ProxyState::Dirty {
                source: None,
                scratch: self.create_scratch().await?,
            };
        }

        if let ProxyState::Clean {
            source,
            scratch: scratch @ None,
        } = state
        {
            *scratch = Some(self.materialize(source).await?);
        }

        match state {
            ProxyState::Dirty { scratch, .. }
            | ProxyState::Clean {
                scratch: Some(scratch),
                ..
            } => Ok(scratch),
            _ => unreachable!("scratch file was materialized above"),
        }
    }

    /// Fetch exactly `source`'s generation into a new scratch file.
    async fn materialize(&self, source: &ObjectRecord) -> Result<ScratchFile, ProxyError> {
        let mut scratch: ScratchFile = self.create_scratch().await?;

        let fetch = async {
            let mut reader: ObjectReader = self
                .bucket
                .fetch_object(&self.name, &source.generation)
                .await?;
            let copied: u64 = scratch.fill_from(&mut reader).await?;
            Ok::<u64, ProxyError>(copied)
        };
        let copied: u64 = with_timeout("fetch", self.options.timeouts.fetch, fetch).await?;

        if copied != source.size as u64 {
            return Err(StorageError::SizeMismatch {
                name: self.name.clone(),
                expected: source.size as u64,
                actual: copied,
            }
            .into());
        }

        tracing::debug!(
            "Materialized {} generation {} ({} bytes) into {}",
            self.name,
            source.generation,
            copied,
            scratch.path().display()
        );

        Ok(scratch)
    }

    async fn create_scratch(&self) -> Result<ScratchFile, ProxyError> {
        let dir: Option<&Path> = self.options.scratch_dir.as_deref();
        Ok(ScratchFile::create(dir).await?)
    }
}

impl fmt::Debug for ObjectProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProxy")
            .field("bucket", &self.bucket.name())
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Run `fut`, failing with `ProxyError::Timeout` if it exceeds `limit`.
async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Option<Duration>,
    fut: F,
) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, ProxyError>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| ProxyError::Timeout { operation, after })?,
        None => fut.await,
    }
}
