use dupehash::duplicates::{DuplicateFinder, FinderConfig};
use dupehash::output::TextOutput;
use dupehash::scanner::Digest;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (map, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(map.is_empty());
    assert!(map.duplicate_groups().is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert_eq!(TextOutput::new(&map.duplicate_groups()).to_text(), "");
}

#[test]
fn test_scan_hello_hello_world() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("A");
    let b = dir.path().join("B");
    let c = dir.path().join("C");
    fs::write(&a, "hello").unwrap();
    fs::write(&b, "hello").unwrap();
    fs::write(&c, "world").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (map, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(map.len(), 2);
    let hello: BTreeSet<PathBuf> = map
        .get(&Digest::of_bytes(b"hello"))
        .unwrap()
        .iter()
        .cloned()
        .collect();
    assert_eq!(hello, BTreeSet::from([a.clone(), b.clone()]));
    assert_eq!(map.get(&Digest::of_bytes(b"world")).unwrap(), &[c]);

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.total_bytes, 15);
    assert_eq!(summary.unique_digests, 2);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);

    let text = TextOutput::new(&map.duplicate_groups()).to_text();
    let expected = format!(
        "{} 2\n  {}\n  {}\n",
        Digest::of_bytes(b"hello").short_id(),
        a.display(),
        b.display()
    );
    assert_eq!(text, expected);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();

    File::create(dir.path().join("a.txt"))
        .unwrap()
        .write_all(b"content a")
        .unwrap();
    File::create(dir.path().join("b.txt"))
        .unwrap()
        .write_all(b"content b")
        .unwrap();
    File::create(dir.path().join("c.txt"))
        .unwrap()
        .write_all(b"content c")
        .unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (map, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(map.len(), 3);
    assert!(map.duplicate_groups().is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir");
    let deeper = sub.join("deeper");
    fs::create_dir_all(&deeper).unwrap();

    fs::write(dir.path().join("a.txt"), "same").unwrap();
    fs::write(sub.join("b.txt"), "same").unwrap();
    fs::write(deeper.join("c.txt"), "same").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (map, summary) = finder.find_duplicates(dir.path()).unwrap();

    let groups = map.duplicate_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
    assert_eq!(summary.duplicate_files, 2);
}

#[test]
fn test_scan_zero_byte_file_not_reported() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data.txt");
    File::create(dir.path().join("empty.txt")).unwrap();
    fs::write(&data, "payload").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (map, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(map.len(), 1);
    assert_eq!(map.total_paths(), 1);
    assert_eq!(map.get(&Digest::of_bytes(b"payload")).unwrap(), &[data]);
    assert_eq!(summary.walk_skipped, 1);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        fs::write(dir.path().join(format!("f{i}.bin")), format!("content {}", i % 4)).unwrap();
    }

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first.to_path_sets(), second.to_path_sets());
    assert_eq!(first.duplicate_groups(), second.duplicate_groups());
    assert_eq!(first.duplicate_groups().len(), 4);
}

#[test]
fn test_scan_large_file_spanning_chunks() {
    let dir = tempdir().unwrap();
    let content = vec![0x5au8; 300 * 1024];
    fs::write(dir.path().join("big1.bin"), &content).unwrap();
    fs::write(dir.path().join("big2.bin"), &content).unwrap();

    let mut different = content.clone();
    *different.last_mut().unwrap() = 0;
    fs::write(dir.path().join("big3.bin"), &different).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (map, summary) = finder.find_duplicates(dir.path()).unwrap();

    let groups = map.duplicate_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].digest, Digest::of_bytes(&content));
    assert_eq!(summary.total_bytes, 3 * 300 * 1024);
}

#[test]
fn test_scan_rendezvous_queue() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        fs::write(dir.path().join(format!("{i}.txt")), "dup").unwrap();
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_queue_depth(0).with_workers(3));
    let (map, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(map.len(), 1);
    assert_eq!(map.total_paths(), 10);
    assert_eq!(summary.workers, 3);
}

#[test]
fn test_scan_root_is_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("single.txt");
    fs::write(&file, "alone").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (map, _) = finder.find_duplicates(&file).unwrap();

    assert_eq!(map.total_paths(), 1);
    assert!(map.duplicate_groups().is_empty());
}

#[cfg(unix)]
#[test]
fn test_scan_symlinks_not_followed() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("target.txt");
    fs::write(&target, "linked").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (map, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(map.total_paths(), 1);
    assert!(map.duplicate_groups().is_empty());
    assert_eq!(summary.walk_skipped, 1);
}
