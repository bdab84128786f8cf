//! Output formatters for duplicate scan results.
//!
//! This module provides the report formats:
//! - Plain text for people reading a terminal
//! - JSON for automation and scripting
//!
//! Both formats only list digests shared by two or more files, in digest
//! order with sorted paths, so the same tree always yields the same report.
//!
//! # Example
//!
//! ```no_run
//! use dupehash::duplicates::DuplicateFinder;
//! use dupehash::error::ExitCode;
//! use dupehash::output::{JsonOutput, TextOutput};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (map, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//! let groups = map.duplicate_groups();
//!
//! TextOutput::new(&groups).write_to(&mut std::io::stdout()).unwrap();
//!
//! let output = JsonOutput::new(&groups, &summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;
