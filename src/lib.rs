//! dupehash - concurrent duplicate file finder
//!
//! Walks a directory tree, hashes every regular non-empty file with BLAKE3 on
//! a pool of worker threads, and groups paths by content digest.
//!
//! The pipeline is a fan-out/fan-in over bounded channels: the walker feeds
//! a path stream, the workers turn paths into `(digest, path)` pairs, and a
//! single aggregator folds the pairs into a [`duplicates::ResultMap`].

pub mod cli;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run dupehash with parsed arguments.
///
/// Returns the exit code for a completed run. Errors that end the run
/// (fatal scan or hash errors, interruption) are returned for `main` to
/// report.
///
/// # Errors
///
/// Returns an error if the signal handler cannot be installed, the scan
/// fails, or the report cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);
    log::debug!("Parsed arguments: {:?}", cli);

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;
    let progress = Arc::new(Progress::new(!cli.show_progress(), !cli.no_color));

    let mut config = FinderConfig::default()
        .with_queue_depth(cli.queue_depth)
        .with_error_policy(cli.error_policy())
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }

    let finder = DuplicateFinder::new(config);
    let (map, summary) = finder.find_duplicates(&cli.path)?;

    for error in &summary.scan_errors {
        log::warn!("Skipped during walk: {}", error);
    }
    for error in &summary.hash_errors {
        log::warn!("Skipped while hashing: {}", error);
    }

    let exit_code = if summary.has_errors() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    let groups = map.duplicate_groups();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&groups)
            .write_to(&mut out)
            .context("Failed to write report")?,
        OutputFormat::Json => JsonOutput::new(&groups, &summary, exit_code)
            .write_to(&mut out, true)
            .context("Failed to write JSON report")?,
    }
    out.flush().context("Failed to write report")?;

    if summary.has_errors() {
        log::warn!(
            "{} entries could not be read; results are incomplete",
            summary.error_count()
        );
    }

    Ok(exit_code)
}
