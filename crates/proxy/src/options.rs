//! Configuration options for the proxy.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration options for an [`ObjectProxy`](crate::ObjectProxy).
///
/// # Example
///
/// ```ignore
/// let options = ProxyOptions::default()
///     .with_scratch_dir("/var/cache/objproxy")
///     .with_timeouts(TimeoutOptions::default().with_fetch(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProxyOptions {
    /// Directory for scratch files. `None` uses the system temp directory.
    pub scratch_dir: Option<PathBuf>,
    /// Timeout settings for bucket calls.
    pub timeouts: TimeoutOptions,
}

impl ProxyOptions {
    /// Set the directory scratch files are created in.
    ///
    /// # Arguments
    /// * `dir` - Existing, writable directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Set timeout options.
    ///
    /// # Arguments
    /// * `timeouts` - Timeout configuration
    pub fn with_timeouts(mut self, timeouts: TimeoutOptions) -> Self {
        self.timeouts = timeouts;
        self
    }
}

// ============================================================================
// Timeout Options
// ============================================================================

/// Timeouts for bucket calls.
///
/// A call that times out fails like any other bucket error and leaves the
/// proxy unchanged. `None` waits indefinitely.
#[derive(Debug, Clone, Default)]
pub struct TimeoutOptions {
    /// Limit on fetching and materializing one generation.
    pub fetch: Option<Duration>,
    /// Limit on creating a new generation during sync.
    pub create: Option<Duration>,
}

impl TimeoutOptions {
    /// Set the fetch timeout.
    pub fn with_fetch(mut self, timeout: Duration) -> Self {
        self.fetch = Some(timeout);
        self
    }

    /// Set the create timeout.
    pub fn with_create(mut self, timeout: Duration) -> Self {
        self.create = Some(timeout);
        self
    }
}
