//! Command-line interface definitions for dupehash.
//!
//! The CLI takes a single directory and a handful of tuning flags; there
//! are no subcommands and no configuration file.
//!
//! # Example
//!
//! ```bash
//! # Report duplicate groups under ~/Downloads
//! dupehash ~/Downloads
//!
//! # JSON report for scripting
//! dupehash ~/Downloads --output json
//!
//! # Skip unreadable files instead of stopping at the first one
//! dupehash --keep-going /srv/data
//!
//! # Pin the worker pool
//! DUPEHASH_WORKERS=4 dupehash -v /srv/data
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::duplicates::{ErrorPolicy, DEFAULT_QUEUE_DEPTH};

/// Find files with identical content under a directory.
///
/// dupehash walks the tree, hashes every regular non-empty file with
/// BLAKE3 on a pool of worker threads, and prints the groups of paths that
/// share a digest.
#[derive(Debug, Parser)]
#[command(name = "dupehash")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and the report
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Directory to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Number of hash worker threads (default: twice the CPU count)
    #[arg(short, long, value_name = "N", env = "DUPEHASH_WORKERS")]
    pub workers: Option<usize>,

    /// Capacity of the internal path and result queues (0 for rendezvous)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_QUEUE_DEPTH)]
    pub queue_depth: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Record unreadable files and directories and keep scanning
    ///
    /// By default the first unreadable entry stops the run.
    #[arg(short = 'k', long)]
    pub keep_going: bool,

    /// Do not draw the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Error policy selected by `--keep-going`.
    #[must_use]
    pub fn error_policy(&self) -> ErrorPolicy {
        if self.keep_going {
            ErrorPolicy::Collect
        } else {
            ErrorPolicy::Abort
        }
    }

    /// Whether the progress spinner should be drawn.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !(self.quiet || self.no_progress)
    }
}

/// Output format for the duplicate report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Short id and count per group, then the indented paths
    Text,
    /// JSON document with groups and summary
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
