//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing BLAKE3 digests
//! of file contents. Files are read in fixed-size chunks so memory use does
//! not depend on file size, and the shutdown flag is checked between chunks
//! so a large file never delays cancellation.
//!
//! # Example
//!
//! ```no_run
//! use dupehash::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.full_hash(Path::new("Cargo.toml")).unwrap();
//! println!("{} {}", digest.short_id(), digest);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::HashError;

/// Size of the read buffer used while streaming a file.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Number of trailing hex characters used for display identifiers.
pub const SHORT_ID_LEN: usize = 7;

/// Raw BLAKE3 output.
pub type Hash = [u8; 32];

/// Content digest of a file.
///
/// Displays as 64 lowercase hex characters. Two files share a digest
/// exactly when their contents are byte-identical (modulo collisions).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(Hash);

impl Digest {
    /// Wrap raw hash bytes.
    #[must_use]
    pub const fn from_bytes(bytes: Hash) -> Self {
        Self(bytes)
    }

    /// Digest of an in-memory byte slice.
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Raw hash bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Full lowercase hexadecimal rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hash_to_hex(&self.0)
    }

    /// Short display identifier: the last [`SHORT_ID_LEN`] hex characters.
    ///
    /// Only meant for humans reading a report; never use it as a key.
    #[must_use]
    pub fn short_id(&self) -> String {
        let hex = self.to_hex();
        hex[hex.len() - SHORT_ID_LEN..].to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_id())
    }
}

impl FromStr for Digest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_hash(s).map(Self).ok_or_else(|| format!("Invalid digest: '{s}'"))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Render hash bytes as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from_bytes(*hash).to_hex().to_string()
}

/// Parse 64 hex characters back into hash bytes.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    blake3::Hash::from_hex(hex).ok().map(|h| *h.as_bytes())
}

/// Streaming BLAKE3 file hasher.
///
/// A `Hasher` holds no per-file state, so one instance is shared by every
/// worker behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct Hasher {
    shutdown_flags: Vec<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a hasher without cancellation support.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort in-flight reads once `flag` becomes `true`.
    ///
    /// May be called more than once; any raised flag stops hashing.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flags.push(flag);
        self
    }

    /// Check if any registered shutdown flag is raised.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flags.iter().any(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the entire contents of `path`.
    ///
    /// Returns the digest together with the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or
    /// [`HashError::Interrupted`] if shutdown was requested mid-file.
    pub fn full_hash_with_len(&self, path: &Path) -> Result<(Digest, u64), HashError> {
        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(path, e)),
            };
            hasher.update(&buf[..n]);
            total += n as u64;
        }

        Ok((Digest(*hasher.finalize().as_bytes()), total))
    }

    /// Hash the entire contents of `path`.
    ///
    /// # Errors
    ///
    /// See [`Hasher::full_hash_with_len`].
    pub fn full_hash(&self, path: &Path) -> Result<Digest, HashError> {
        self.full_hash_with_len(path).map(|(digest, _)| digest)
    }
}

fn map_io_error(path: &Path, error: std::io::Error) -> HashError {
    match error.kind() {
        ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
