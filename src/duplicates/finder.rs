//! Pipeline coordinator.
//!
//! # Overview
//!
//! [`DuplicateFinder`] wires the walker, the hash worker pool and the
//! aggregator together and owns their shutdown order:
//!
//! 1. Size the pool; create the path stream, pair stream, completion
//!    channel and the single-slot result channel.
//! 2. Spawn the workers.
//! 3. Spawn the aggregator.
//! 4. Walk the tree on the caller's thread, feeding the path stream.
//! 5. Close the path stream.
//! 6. Wait for one completion signal per worker.
//! 7. Close the pair stream. No worker can still be sending at this point.
//! 8. Receive the aggregator's single result.
//!
//! Closing a stream is dropping the coordinator's last sender. Steps 5 to 8
//! run even when the walk fails, so every thread is joined before the
//! error is returned.
//!
//! # Example
//!
//! ```no_run
//! use dupehash::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_workers(8));
//! let (map, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! for group in map.duplicate_groups() {
//!     println!("{} {}", group.short_id(), group.len());
//! }
//! println!("{} files hashed", summary.total_files);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::groups::{aggregate, Aggregate, PairMessage, ResultMap};
use super::worker::{spawn_worker, WorkerContext};
use super::ErrorPolicy;
use crate::progress::ProgressCallback;
use crate::scanner::{HashError, Hasher, ScanError, WalkStats, Walker, WalkerConfig};

/// Default depth of the path and pair streams.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// Phase name reported to progress callbacks.
pub const HASHING_PHASE: &str = "hashing";

/// Default pool size: twice the available parallelism, at least 1.
///
/// Hashing alternates between waiting on disk and burning CPU, so
/// oversubscribing the cores keeps both busy.
#[must_use]
pub fn default_worker_count() -> usize {
    let cpus = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    (cpus * 2).max(1)
}

/// Configuration for a [`DuplicateFinder`].
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hash workers. `None` uses [`default_worker_count`].
    pub workers: Option<usize>,
    /// Capacity of the path and pair streams. 0 means rendezvous.
    pub queue_depth: usize,
    /// What to do with unreadable files and directories.
    pub error_policy: ErrorPolicy,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("workers", &self.workers)
            .field("queue_depth", &self.queue_depth)
            .field("error_policy", &self.error_policy)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            workers: None,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            error_policy: ErrorPolicy::Abort,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hash workers (clamped to at least 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Set the capacity of the path and pair streams.
    #[must_use]
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    /// Set the error policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Worker count this configuration resolves to.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count).max(1)
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics about a completed run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Files hashed
    pub total_files: usize,
    /// Bytes hashed
    pub total_bytes: u64,
    /// Distinct digests
    pub unique_digests: usize,
    /// Digests shared by two or more files
    pub duplicate_groups: usize,
    /// Files beyond the first in each duplicate group
    pub duplicate_files: usize,
    /// Entries skipped by the walker (empty or non-regular)
    pub walk_skipped: usize,
    /// Entries that vanished mid-walk
    pub vanished: usize,
    /// Walk errors recorded under [`ErrorPolicy::Collect`]
    pub scan_errors: Vec<ScanError>,
    /// Hash errors recorded under [`ErrorPolicy::Collect`]
    pub hash_errors: Vec<HashError>,
    /// Worker threads used
    pub workers: usize,
    /// Wall-clock time of the run
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Check whether any error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty() || !self.hash_errors.is_empty()
    }

    /// Number of recorded errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.scan_errors.len() + self.hash_errors.len()
    }

    fn record(
        &mut self,
        walk: WalkStats,
        map: &ResultMap,
        total_bytes: u64,
        errors: Vec<HashError>,
    ) {
        let groups = map.duplicate_groups();
        self.total_files = map.total_paths();
        self.total_bytes = total_bytes;
        self.unique_digests = map.len();
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(|g| g.len() - 1).sum();
        self.walk_skipped = walk.skipped;
        self.vanished = walk.vanished;
        self.scan_errors = walk.errors;
        self.hash_errors = errors;
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The walk failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A file could not be hashed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A pipeline thread could not be started.
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// A pipeline thread panicked.
    #[error("Pipeline thread panicked: {0}")]
    ThreadPanicked(String),
}

/// Runs the walk/hash/aggregate pipeline over a directory tree.
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Configuration of this finder.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Hash every regular, non-empty file under `root` and group paths by digest.
    ///
    /// The returned map is complete: it is only produced after every worker
    /// has exited and every pair has been aggregated.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The walk hits a fatal error (the root is missing, a directory is unreadable)
    /// - A file cannot be opened or read under [`ErrorPolicy::Abort`]
    /// - The shutdown flag was raised
    /// - A pipeline thread could not be spawned or panicked
    pub fn find_duplicates(&self, root: &Path) -> Result<(ResultMap, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let workers = self.config.worker_count();
        let policy = self.config.error_policy;

        // 1. Streams, completion channel and the result slot.
        let (path_tx, path_rx) = crossbeam_channel::bounded::<PathBuf>(self.config.queue_depth);
        let (pair_tx, pair_rx) = crossbeam_channel::bounded::<PairMessage>(self.config.queue_depth);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<usize>(workers);
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);

        let abort_flag = Arc::new(AtomicBool::new(false));
        let mut hasher = Hasher::new().with_shutdown_flag(Arc::clone(&abort_flag));
        if let Some(flag) = &self.config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        let ctx = WorkerContext {
            hasher: Arc::new(hasher),
            abort_flag: Arc::clone(&abort_flag),
            error_policy: policy,
            progress: self.config.progress_callback.clone(),
            processed: Arc::new(AtomicUsize::new(0)),
        };

        log::debug!(
            "Starting scan of {} with {} workers (queue depth {})",
            root.display(),
            workers,
            self.config.queue_depth
        );
        if let Some(progress) = &self.config.progress_callback {
            progress.on_phase_start(HASHING_PHASE, 0);
        }

        // 2. Workers. On a spawn failure the channels drop here, which lets
        // any worker already started drain and exit.
        let mut worker_handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let handle = spawn_worker(
                id,
                path_rx.clone(),
                pair_tx.clone(),
                done_tx.clone(),
                ctx.clone(),
            )
            .map_err(FinderError::ThreadSpawn)?;
            worker_handles.push(handle);
        }
        drop(path_rx);
        drop(done_tx);

        // 3. Aggregator.
        let aggregator = thread::Builder::new()
            .name("dupehash-aggregate".to_string())
            .spawn(move || {
                let outcome = aggregate(&pair_rx, policy);
                // Single write into the single slot.
                let _ = result_tx.send(outcome);
            })
            .map_err(FinderError::ThreadSpawn)?;

        // 4. Walk on this thread.
        let mut walker = Walker::new(root, WalkerConfig::new(policy))
            .with_shutdown_flag(Arc::clone(&abort_flag));
        if let Some(flag) = &self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        let walk_result = walker.walk_into(&path_tx);
        if let Err(e) = &walk_result {
            log::debug!("Walk failed: {}", e);
            abort_flag.store(true, Ordering::SeqCst);
        }

        // 5. No more paths.
        drop(path_tx);
        log::debug!("Path stream closed");

        // 6. Completion barrier.
        let mut finished = 0;
        while finished < workers {
            if done_rx.recv().is_err() {
                break;
            }
            finished += 1;
        }
        log::debug!("{} of {} workers signaled completion", finished, workers);

        // 7. No more pairs.
        drop(pair_tx);
        log::debug!("Pair stream closed");

        // 8. The single result.
        let aggregated = result_rx.recv();

        let joined = join_all(worker_handles, aggregator);
        if let Some(progress) = &self.config.progress_callback {
            progress.on_phase_end(HASHING_PHASE);
        }
        joined?;

        let aggregated = aggregated
            .map_err(|_| FinderError::ThreadPanicked("dupehash-aggregate".to_string()))?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        let walk = match walk_result {
            Ok(stats) => Some(stats),
            Err(ScanError::Interrupted) => None,
            Err(e) => return Err(FinderError::Scan(e)),
        };
        let outcome = match aggregated {
            Ok(outcome) => outcome,
            Err(HashError::Interrupted(_)) => return Err(FinderError::Interrupted),
            Err(e) => return Err(FinderError::Hash(e)),
        };
        // The walker only stops on the internal flag when a worker failed,
        // and that failure is reported above.
        let walk = walk.ok_or(FinderError::Interrupted)?;

        let Aggregate {
            map,
            total_bytes,
            errors,
        } = outcome;
        let mut summary = ScanSummary {
            workers,
            ..ScanSummary::default()
        };
        summary.record(walk, &map, total_bytes, errors);
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Hashed {} files into {} digests ({} duplicate groups) in {:.2?}",
            summary.total_files,
            summary.unique_digests,
            summary.duplicate_groups,
            summary.scan_duration
        );

        Ok((map, summary))
    }
}

fn join_all(workers: Vec<JoinHandle<()>>, aggregator: JoinHandle<()>) -> Result<(), FinderError> {
    let mut panicked = None;
    for handle in workers {
        let name = handle.thread().name().unwrap_or("worker").to_string();
        if handle.join().is_err() {
            log::error!("Thread {} panicked", name);
            panicked.get_or_insert(name);
        }
    }
    if aggregator.join().is_err() {
        log::error!("Aggregator thread panicked");
        panicked.get_or_insert_with(|| "dupehash-aggregate".to_string());
    }
    match panicked {
        Some(name) => Err(FinderError::ThreadPanicked(name)),
        None => Ok(()),
    }
}
