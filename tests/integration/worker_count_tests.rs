use dupehash::duplicates::{default_worker_count, DuplicateFinder, FinderConfig};
use std::fs;
use tempfile::{tempdir, TempDir};

fn populated_dir() -> TempDir {
    let dir = tempdir().unwrap();
    for d in 0..4 {
        let sub = dir.path().join(format!("dir_{d}"));
        fs::create_dir(&sub).unwrap();
        for f in 0..25 {
            fs::write(sub.join(format!("file_{f}.txt")), format!("payload {}", f % 7)).unwrap();
        }
    }
    dir
}

#[test]
fn test_default_worker_count_is_positive() {
    assert!(default_worker_count() >= 1);
    assert_eq!(FinderConfig::default().worker_count(), default_worker_count());
}

#[test]
fn test_zero_workers_clamped_to_one() {
    let config = FinderConfig::default().with_workers(0);
    assert_eq!(config.worker_count(), 1);
}

#[test]
fn test_results_independent_of_worker_count() {
    let dir = populated_dir();

    let (single, summary_single) = DuplicateFinder::new(FinderConfig::default().with_workers(1))
        .find_duplicates(dir.path())
        .unwrap();
    let (default, summary_default) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let (many, summary_many) = DuplicateFinder::new(FinderConfig::default().with_workers(64))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(single.to_path_sets(), default.to_path_sets());
    assert_eq!(single.to_path_sets(), many.to_path_sets());
    assert_eq!(single.len(), 7);
    assert_eq!(single.total_paths(), 100);

    assert_eq!(summary_single.workers, 1);
    assert_eq!(summary_default.workers, default_worker_count());
    assert_eq!(summary_many.workers, 64);
}

#[test]
fn test_more_workers_than_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "x").unwrap();
    fs::write(dir.path().join("b"), "x").unwrap();

    let (map, _) = DuplicateFinder::new(FinderConfig::default().with_workers(32))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(map.duplicate_groups().len(), 1);
}
