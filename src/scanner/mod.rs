//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Walking a directory tree and emitting regular, non-empty files
//! - Content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupehash::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let stats = walker.walk_into(&tx).unwrap();
//! drop(tx);
//!
//! println!("{} files emitted", stats.emitted);
//! for path in rx {
//!     println!("{}", path.display());
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Digest, Hash, Hasher, CHUNK_SIZE, SHORT_ID_LEN};
pub use walker::{WalkStats, Walker};

use crate::duplicates::ErrorPolicy;

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// What to do with entry errors other than "does not exist".
    pub error_policy: ErrorPolicy,
}

impl WalkerConfig {
    /// Create a configuration with the given error policy.
    #[must_use]
    pub fn new(error_policy: ErrorPolicy) -> Self {
        Self { error_policy }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The scan root was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Shutdown was requested while walking.
    #[error("Walk interrupted")]
    Interrupted,

    /// Every consumer of the path stream has gone away.
    #[error("Path stream closed before the walk finished")]
    Disconnected,
}

impl ScanError {
    /// The path this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) => Some(p),
            Self::Io { path, .. } => Some(path),
            Self::Interrupted | Self::Disconnected => None,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Shutdown was requested while the file was being read.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walker_config_default() {
        let config = WalkerConfig::default();
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::PermissionDenied(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "Permission denied: /test");

        let err = ScanError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "Path not found: /missing");

        assert_eq!(ScanError::Interrupted.to_string(), "Walk interrupted");
        assert!(ScanError::Interrupted.path().is_none());
    }

    #[test]
    fn test_hash_error_display() {
        let err = HashError::NotFound(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "File not found: /test");

        let err = HashError::PermissionDenied(PathBuf::from("/secret"));
        assert_eq!(err.to_string(), "Permission denied: /secret");
        assert_eq!(err.path(), std::path::Path::new("/secret"));
    }
}
