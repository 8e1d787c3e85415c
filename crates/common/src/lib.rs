//! Shared types and utilities for rusty-objproxy.
//!
//! This crate provides functionality used across the rusty-objproxy crates:
//! - Caller-supplied cancellation signal for network-facing operations
//! - Shared constants

pub mod cancel;
pub mod constants;

// Re-export commonly used items at crate root
pub use cancel::CancelToken;
pub use constants::*;
