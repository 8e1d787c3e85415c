//! In-process bucket backend.
//!
//! Keeps every generation of every object in memory. Useful for embedding
//! the proxy without a network backend and as a test double: it counts
//! requests and supports one-shot fault injection.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::StorageError;
use crate::traits::{Bucket, ObjectReader};
use crate::types::{Generation, ObjectRecord};

/// Bucket that stores all object generations in memory.
pub struct MemoryBucket {
    /// Bucket name.
    name: String,
    /// Object generations and pending injected faults.
    state: Mutex<MemoryState>,
    /// Number of fetch requests received.
    fetch_count: AtomicU64,
    /// Number of create requests received.
    create_count: AtomicU64,
}

#[derive(Default)]
struct MemoryState {
    /// Object name → generation number → content.
    objects: HashMap<String, BTreeMap<u64, Vec<u8>>>,
    /// Last generation number handed out.
    last_generation: u64,
    /// Error returned by the next fetch request.
    fail_next_fetch: Option<StorageError>,
    /// Error returned by the next create request.
    fail_next_create: Option<StorageError>,
}

impl MemoryState {
    fn store(&mut self, name: &str, data: Vec<u8>) -> ObjectRecord {
        self.last_generation += 1;
        let generation: u64 = self.last_generation;
        let size: i64 = data.len() as i64;

        self.objects
            .entry(name.to_string())
            .or_default()
            .insert(generation, data);

        ObjectRecord::new(name, generation, size)
    }
}

impl MemoryBucket {
    /// Create an empty bucket.
    ///
    /// # Arguments
    /// * `name` - Bucket name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(MemoryState::default()),
            fetch_count: AtomicU64::new(0),
            create_count: AtomicU64::new(0),
        }
    }

    /// Store a new generation as an external writer would.
    ///
    /// Does not count as a create request.
    ///
    /// # Arguments
    /// * `name` - Object name
    /// * `data` - Object content
    ///
    /// # Returns
    /// Record of the new generation.
    pub fn insert(&self, name: &str, data: impl Into<Vec<u8>>) -> ObjectRecord {
        self.state.lock().unwrap().store(name, data.into())
    }

    /// Get the record of the newest generation of an object.
    ///
    /// # Arguments
    /// * `name` - Object name
    pub fn latest(&self, name: &str) -> Option<ObjectRecord> {
        let guard = self.state.lock().unwrap();
        guard
            .objects
            .get(name)
            .and_then(|generations| generations.iter().next_back())
            .map(|(generation, data)| ObjectRecord::new(name, *generation, data.len() as i64))
    }

    /// Get the content of one generation of an object.
    ///
    /// # Arguments
    /// * `name` - Object name
    /// * `generation` - Generation to look up
    pub fn contents(&self, name: &str, generation: &Generation) -> Option<Vec<u8>> {
        let number: u64 = generation.as_str().parse().ok()?;
        let guard = self.state.lock().unwrap();
        guard
            .objects
            .get(name)
            .and_then(|generations| generations.get(&number))
            .cloned()
    }

    /// Number of fetch requests received so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Number of create requests received so far.
    pub fn create_count(&self) -> u64 {
        self.create_count.load(Ordering::SeqCst)
    }

    /// Make the next fetch request fail with the given error.
    pub fn fail_next_fetch(&self, err: StorageError) {
        self.state.lock().unwrap().fail_next_fetch = Some(err);
    }

    /// Make the next create request fail with the given error.
    pub fn fail_next_create(&self, err: StorageError) {
        self.state.lock().unwrap().fail_next_create = Some(err);
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_object(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<ObjectReader, StorageError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.state.lock().unwrap().fail_next_fetch.take() {
            log::debug!("Injected fetch failure for {}#{}: {}", name, generation, err);
            return Err(err);
        }

        let data: Vec<u8> =
            self.contents(name, generation)
                .ok_or_else(|| StorageError::NotFound {
                    name: name.to_string(),
                    generation: generation.clone(),
                })?;

        Ok(Box::pin(Cursor::new(data)))
    }

    async fn create_object(
        &self,
        name: &str,
        contents: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<ObjectRecord, StorageError> {
        self.create_count.fetch_add(1, Ordering::SeqCst);

        let mut data: Vec<u8> = Vec::new();
        contents.read_to_end(&mut data).await?;

        let mut guard = self.state.lock().unwrap();
        if let Some(err) = guard.fail_next_create.take() {
            log::debug!("Injected create failure for {}: {}", name, err);
            return Err(err);
        }

        let record: ObjectRecord = guard.store(name, data);
        log::debug!(
            "Created {}#{} ({} bytes) in bucket {}",
            record.name,
            record.generation,
            record.size,
            self.name
        );
        Ok(record)
    }
}
