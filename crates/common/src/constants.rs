//! Shared constants used across rusty-objproxy crates.

/// Prefix for scratch files holding materialized object content.
pub const SCRATCH_FILE_PREFIX: &str = "objproxy-";

/// Suffix for scratch files.
pub const SCRATCH_FILE_SUFFIX: &str = ".scratch";
