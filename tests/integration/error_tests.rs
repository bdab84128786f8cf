use dupehash::duplicates::{DuplicateFinder, ErrorPolicy, FinderConfig, FinderError};
#[cfg(unix)]
use dupehash::progress::ProgressCallback;
use dupehash::scanner::{HashError, ScanError};
use std::fs;
use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
#[cfg(unix)]
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_nonexistent_root_fails() {
    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(Path::new("/nonexistent/dupehash/root"));

    assert!(matches!(
        result,
        Err(FinderError::Scan(ScanError::NotFound(_)))
    ));
}

#[test]
fn test_shutdown_flag_interrupts_run() {
    let dir = tempdir().unwrap();
    for i in 0..50 {
        fs::write(dir.path().join(format!("{i}.txt")), "data").unwrap();
    }

    let flag = Arc::new(AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));
    let result = finder.find_duplicates(dir.path());

    assert!(matches!(result, Err(FinderError::Interrupted)));
}

#[test]
fn test_interrupted_error_display() {
    assert_eq!(FinderError::Interrupted.to_string(), "Scan interrupted by user");
}

/// After the first file is hashed, turns every other file into a directory.
///
/// Whether the walker listed those entries before or after the swap, they
/// reach a worker as paths to hash, and reading a directory fails even for
/// root. The child is empty so a re-listed directory adds nothing to hash.
#[cfg(unix)]
struct ReplaceSiblings {
    files: Vec<PathBuf>,
    fired: AtomicBool,
}

#[cfg(unix)]
impl ReplaceSiblings {
    fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            fired: AtomicBool::new(false),
        }
    }
}

#[cfg(unix)]
impl ProgressCallback for ReplaceSiblings {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, _current: usize, path: &str) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        for file in self.files.iter().filter(|f| f.as_path() != Path::new(path)) {
            fs::remove_file(file).unwrap();
            fs::create_dir(file).unwrap();
            fs::File::create(file.join("inner.txt")).unwrap();
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[cfg(unix)]
fn files_in(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("file_{i}.txt"));
            fs::write(&path, format!("content {i}")).unwrap();
            path
        })
        .collect()
}

#[cfg(unix)]
#[test]
fn test_file_replaced_after_walk_fails_run() {
    let dir = tempdir().unwrap();
    let files = files_in(dir.path(), 3);

    let config = FinderConfig::default()
        .with_workers(1)
        .with_progress_callback(Arc::new(ReplaceSiblings::new(files.clone())));
    let result = DuplicateFinder::new(config).find_duplicates(dir.path());

    match result {
        Err(FinderError::Hash(HashError::Io { path, .. })) => assert!(files.contains(&path)),
        other => panic!("Expected read error, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_file_replaced_after_walk_collected_with_keep_going() {
    let dir = tempdir().unwrap();
    let files = files_in(dir.path(), 3);

    let config = FinderConfig::default()
        .with_workers(1)
        .with_error_policy(ErrorPolicy::Collect)
        .with_progress_callback(Arc::new(ReplaceSiblings::new(files)));
    let (map, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(map.total_paths(), 1);
    assert!(summary.has_errors());
    assert!(!summary.hash_errors.is_empty());
    assert!(summary
        .hash_errors
        .iter()
        .all(|e| matches!(e, HashError::Io { .. })));
}

/// Lock `path` against reading. Returns false when the current user can
/// read it anyway (root), in which case the caller has nothing to test.
#[cfg(unix)]
fn lock_down(path: &Path, mode: u32) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    let readable = if path.is_dir() {
        fs::read_dir(path).is_ok()
    } else {
        fs::File::open(path).is_ok()
    };
    if readable {
        unlock(path, 0o644);
    }
    !readable
}

#[cfg(unix)]
fn unlock(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_fails_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    let locked = dir.path().join("locked.txt");
    fs::write(&locked, "secret").unwrap();
    if !lock_down(&locked, 0o000) {
        return;
    }

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(dir.path());
    unlock(&locked, 0o644);

    match result {
        Err(FinderError::Hash(HashError::PermissionDenied(path))) => assert_eq!(path, locked),
        other => panic!("Expected permission error, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_collected_with_keep_going() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    let locked = dir.path().join("locked.txt");
    fs::write(&locked, "secret").unwrap();
    if !lock_down(&locked, 0o000) {
        return;
    }

    let finder =
        DuplicateFinder::new(FinderConfig::default().with_error_policy(ErrorPolicy::Collect));
    let result = finder.find_duplicates(dir.path());
    unlock(&locked, 0o644);

    let (map, summary) = result.unwrap();
    assert_eq!(map.duplicate_groups().len(), 1);
    assert_eq!(map.total_paths(), 2);
    assert!(summary.has_errors());
    assert_eq!(summary.hash_errors.len(), 1);
    assert_eq!(summary.hash_errors[0].path(), locked.as_path());
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_fails_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inner.txt"), "hidden").unwrap();
    if !lock_down(&locked, 0o000) {
        return;
    }

    let abort = DuplicateFinder::with_defaults().find_duplicates(dir.path());
    let collect =
        DuplicateFinder::new(FinderConfig::default().with_error_policy(ErrorPolicy::Collect))
            .find_duplicates(dir.path());
    unlock(&locked, 0o755);

    assert!(matches!(
        abort,
        Err(FinderError::Scan(ScanError::PermissionDenied(_)))
    ));
    let (map, summary) = collect.unwrap();
    assert_eq!(map.total_paths(), 1);
    assert_eq!(summary.scan_errors.len(), 1);
}
