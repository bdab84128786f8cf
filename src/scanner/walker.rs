//! Directory walker feeding the hash worker pool.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, which traverses a directory
//! tree with [`walkdir`] on the caller's thread and sends the path of every
//! regular, non-empty file into a channel consumed by the worker pool.
//!
//! The walker never closes the channel it writes to. Closing is left to
//! whoever owns the sender, after `walk_into` has returned, so no send can
//! race with the close.
//!
//! # Error handling
//!
//! - An entry that disappears between listing and stat is tolerated and
//!   counted in [`WalkStats::vanished`].
//! - Any other entry error is fatal under [`ErrorPolicy::Abort`] and recorded
//!   in [`WalkStats::errors`] under [`ErrorPolicy::Collect`].
//! - Errors on the root itself are always fatal.
//!
//! # Example
//!
//! ```no_run
//! use dupehash::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let stats = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default())
//!     .walk_into(&tx)
//!     .unwrap();
//! drop(tx);
//! assert_eq!(rx.iter().count(), stats.emitted);
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use walkdir::WalkDir;

use super::{ScanError, WalkerConfig};
use crate::duplicates::ErrorPolicy;

/// Counters collected during a walk.
#[derive(Debug, Default)]
pub struct WalkStats {
    /// Paths sent to the path stream
    pub emitted: usize,
    /// Entries that were not regular, non-empty files (directories excluded)
    pub skipped: usize,
    /// Entries that disappeared mid-walk
    pub vanished: usize,
    /// Non-fatal errors recorded under [`ErrorPolicy::Collect`]
    pub errors: Vec<ScanError>,
}

/// Directory walker emitting candidate file paths.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Shutdown flags for graceful termination
    shutdown_flags: Vec<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    ///
    /// The root may be a directory or a single file.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flags: Vec::new(),
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag becomes `true` the walk stops before the next entry
    /// and returns [`ScanError::Interrupted`]. May be called more than once.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flags.push(flag);
        self
    }

    /// Root path of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flags.iter().any(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, sending every regular, non-empty file to `paths`.
    ///
    /// Blocks whenever `paths` is a full bounded channel, which throttles
    /// the walk to the speed of its consumers.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`ScanError`], [`ScanError::Interrupted`] if
    /// shutdown was requested, or [`ScanError::Disconnected`] if every
    /// receiver of `paths` was dropped.
    pub fn walk_into(&self, paths: &Sender<PathBuf>) -> Result<WalkStats, ScanError> {
        let mut stats = WalkStats::default();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping walk");
                return Err(ScanError::Interrupted);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.handle_walk_error(e, &mut stats)?;
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                log::trace!("Skipping non-regular entry: {}", entry.path().display());
                stats.skipped += 1;
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    self.handle_walk_error(e, &mut stats)?;
                    continue;
                }
            };

            if metadata.len() == 0 {
                log::trace!("Skipping empty file: {}", entry.path().display());
                stats.skipped += 1;
                continue;
            }

            log::trace!("Found file: {}", entry.path().display());
            paths
                .send(entry.into_path())
                .map_err(|_| ScanError::Disconnected)?;
            stats.emitted += 1;
        }

        log::debug!(
            "Walk of {} complete: {} emitted, {} skipped, {} vanished",
            self.root.display(),
            stats.emitted,
            stats.skipped,
            stats.vanished
        );
        Ok(stats)
    }

    /// Decide whether a walk error ends the walk.
    fn handle_walk_error(
        &self,
        error: walkdir::Error,
        stats: &mut WalkStats,
    ) -> Result<(), ScanError> {
        let at_root = error.depth() == 0;
        let error = self.convert_error(error);

        if at_root {
            return Err(error);
        }

        if let ScanError::NotFound(path) = &error {
            log::debug!("Entry vanished during walk: {}", path.display());
            stats.vanished += 1;
            return Ok(());
        }

        match self.config.error_policy {
            ErrorPolicy::Abort => Err(error),
            ErrorPolicy::Collect => {
                log::warn!("{}", error);
                stats.errors.push(error);
                Ok(())
            }
        }
    }

    /// Convert a walkdir error into a [`ScanError`].
    fn convert_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::NotFound) => ScanError::NotFound(path),
            Some(ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
            _ => {
                let message = error.to_string();
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(message));
                ScanError::Io { path, source }
            }
        }
    }
}
