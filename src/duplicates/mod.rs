//! Duplicate detection module.
//!
//! This module provides the concurrent hashing pipeline:
//! - Hash worker pool ([`worker`])
//! - Aggregation of `(digest, path)` pairs into a [`ResultMap`] ([`groups`])
//! - The coordinator that owns the pipeline lifecycle ([`finder`])

pub mod finder;
pub mod groups;
mod worker;

pub use finder::{
    default_worker_count, DuplicateFinder, FinderConfig, FinderError, ScanSummary,
    DEFAULT_QUEUE_DEPTH,
};
pub use groups::{DuplicateGroup, HashedEntry, ResultMap};

/// What to do when a file cannot be read or a directory cannot be listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the run at the first error and return no result.
    #[default]
    Abort,
    /// Record the error, skip the entry, and keep going.
    Collect,
}
