//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display a spinner on stderr while files are being hashed.
//!
//! The total number of files is not known until the walk finishes, and the
//! walk overlaps with hashing, so progress is a running count rather than
//! a bar with a length.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for the hashing pipeline.
///
/// Implementations are called concurrently from every hash worker and must
/// be cheap.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (e.g., "hashing")
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of items processed so far (1-based)
    /// * `path` - Path just processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, providing its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Spinner-based progress reporter.
pub struct Progress {
    bar: ProgressBar,
    bytes: AtomicU64,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    /// * `color` - Whether the spinner may use ANSI colors.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupehash::progress::Progress;
    ///
    /// let progress = Progress::new(true, false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool, color: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr())
        };
        bar.set_style(Self::hashing_style(color));
        Self {
            bar,
            bytes: AtomicU64::new(0),
        }
    }

    fn hashing_style(color: bool) -> ProgressStyle {
        let template = if color {
            "{spinner:.green} {msg} [{elapsed_precise}] {pos} files {prefix}"
        } else {
            "{spinner} {msg} [{elapsed_precise}] {pos} files {prefix}"
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    /// Bytes reported through [`ProgressCallback::on_item_completed`].
    #[must_use]
    pub fn bytes_processed(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        self.bar.set_message(format!("Running {phase}"));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_progress(&self, current: usize, _path: &str) {
        self.bar.set_position(current as u64);
    }

    fn on_item_completed(&self, bytes: u64) {
        let total = self.bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.bar.set_prefix(format!("({})", HumanBytes(total)));
    }

    fn on_phase_end(&self, phase: &str) {
        self.bar.finish_and_clear();
        log::debug!("Phase {} finished after {} files", phase, self.bar.position());
    }
}
