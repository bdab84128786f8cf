//! Digest-to-paths aggregation.
//!
//! # Overview
//!
//! Workers produce one [`HashedEntry`] per file. The aggregator folds those
//! entries into a [`ResultMap`], keyed by digest, on a thread of its own.
//! The map is handed to the caller once, after the pair stream is closed
//! and drained, and has no public mutators afterwards.
//!
//! # Example
//!
//! ```
//! use dupehash::duplicates::{HashedEntry, ResultMap};
//! use dupehash::scanner::Digest;
//! use std::path::PathBuf;
//!
//! let map: ResultMap = vec![
//!     HashedEntry::new(Digest::of_bytes(b"hello"), PathBuf::from("/a"), 5),
//!     HashedEntry::new(Digest::of_bytes(b"hello"), PathBuf::from("/b"), 5),
//!     HashedEntry::new(Digest::of_bytes(b"world"), PathBuf::from("/c"), 5),
//! ]
//! .into_iter()
//! .collect();
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.duplicate_groups().len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use crossbeam_channel::Receiver;

use super::ErrorPolicy;
use crate::scanner::{Digest, HashError};

/// A `(digest, path)` pair produced by a hash worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedEntry {
    /// Content digest
    pub digest: Digest,
    /// File that produced it
    pub path: PathBuf,
    /// Bytes read while hashing
    pub size: u64,
}

impl HashedEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(digest: Digest, path: PathBuf, size: u64) -> Self {
        Self { digest, path, size }
    }
}

/// Message sent from a worker to the aggregator.
#[derive(Debug)]
pub(crate) enum PairMessage {
    Hashed(HashedEntry),
    Failed(HashError),
}

/// Mapping from digest to every path whose content hashed to it.
///
/// Paths within a digest are in the order the aggregator received them,
/// which depends on worker scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultMap {
    groups: HashMap<Digest, Vec<PathBuf>>,
}

impl ResultMap {
    fn insert(&mut self, entry: HashedEntry) {
        self.groups.entry(entry.digest).or_default().push(entry.path);
    }

    /// Paths that hashed to `digest`.
    #[must_use]
    pub fn get(&self, digest: &Digest) -> Option<&[PathBuf]> {
        self.groups.get(digest).map(Vec::as_slice)
    }

    /// Paths for a digest given as a 64 character hex string.
    #[must_use]
    pub fn get_hex(&self, hex: &str) -> Option<&[PathBuf]> {
        hex.parse::<Digest>().ok().and_then(|d| self.get(&d))
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check whether no file was hashed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of paths across all digests.
    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Iterate over `(digest, paths)` in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &[PathBuf])> {
        self.groups.iter().map(|(d, p)| (d, p.as_slice()))
    }

    /// Groups with two or more paths, sorted by digest, paths sorted.
    #[must_use]
    pub fn duplicate_groups(&self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .groups
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(digest, paths)| {
                let mut files = paths.clone();
                files.sort();
                DuplicateGroup::new(*digest, files)
            })
            .collect();
        groups.sort_by(|a, b| a.digest.cmp(&b.digest));
        groups
    }

    /// Order-insensitive view: hex digest to set of paths.
    ///
    /// Two runs over the same unmodified tree produce equal views.
    #[must_use]
    pub fn to_path_sets(&self) -> BTreeMap<String, BTreeSet<PathBuf>> {
        self.groups
            .iter()
            .map(|(d, p)| (d.to_hex(), p.iter().cloned().collect()))
            .collect()
    }

    /// Consume the map.
    #[must_use]
    pub fn into_inner(self) -> HashMap<Digest, Vec<PathBuf>> {
        self.groups
    }
}

impl FromIterator<HashedEntry> for ResultMap {
    fn from_iter<I: IntoIterator<Item = HashedEntry>>(iter: I) -> Self {
        let mut map = Self::default();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}

/// Files sharing one digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Shared content digest
    pub digest: Digest,
    /// Paths with that content
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(digest: Digest, files: Vec<PathBuf>) -> Self {
        Self { digest, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Short display identifier of the digest.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.digest.short_id()
    }
}

/// Everything the aggregator learned from the pair stream.
#[derive(Debug, Default)]
pub(crate) struct Aggregate {
    pub map: ResultMap,
    pub total_bytes: u64,
    pub errors: Vec<HashError>,
}

/// Drain `pairs` until every sender is dropped.
///
/// Under [`ErrorPolicy::Abort`] the first error becomes the outcome and
/// the remaining messages are discarded, but the stream is still drained so
/// no worker blocks on a full queue.
pub(crate) fn aggregate(
    pairs: &Receiver<PairMessage>,
    policy: ErrorPolicy,
) -> Result<Aggregate, HashError> {
    let mut outcome = Aggregate::default();
    let mut first_error: Option<HashError> = None;
    // Reads cut short by a raised flag; never outrank the error that raised it.
    let mut interrupted: Option<HashError> = None;

    for message in pairs.iter() {
        if first_error.is_some() {
            continue;
        }
        match message {
            PairMessage::Hashed(entry) => {
                outcome.total_bytes += entry.size;
                outcome.map.insert(entry);
            }
            PairMessage::Failed(error @ HashError::Interrupted(_)) => {
                interrupted.get_or_insert(error);
            }
            PairMessage::Failed(error) => match policy {
                ErrorPolicy::Abort => first_error = Some(error),
                ErrorPolicy::Collect => outcome.errors.push(error),
            },
        }
    }

    log::debug!(
        "Aggregator: pair stream closed, {} digests from {} paths",
        outcome.map.len(),
        outcome.map.total_paths()
    );

    match first_error.or(interrupted) {
        Some(error) => Err(error),
        None => Ok(outcome),
    }
}
