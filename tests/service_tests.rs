use hashdex::cache::{HashCache, HashStore};
use hashdex::config::{BrowseConfig, Settings};
use hashdex::listing::{SortKey, SortOrder};
use hashdex::service::{BrowseError, BrowseService};
use std::fs::File;
use std::io::Write;
use tempfile::{tempdir, TempDir};

fn service_with(dir: &TempDir, settings: Settings) -> BrowseService {
    let config = BrowseConfig::new(dir.path(), settings).unwrap();
    let cache = HashCache::new(HashStore::open_in_memory().unwrap());
    BrowseService::new(&config, cache)
}

/// Base directory with `a.txt` (10 bytes) and `sub/` containing `b.txt`.
fn scenario_tree() -> TempDir {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("a.txt"))
        .unwrap()
        .write_all(b"0123456789")
        .unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    File::create(dir.path().join("sub").join("b.txt"))
        .unwrap()
        .write_all(b"inner")
        .unwrap();
    dir
}

#[test]
fn test_browse_root_default_order() {
    let dir = scenario_tree();
    let service = service_with(&dir, Settings::default());

    let page = service.browse(Some(""), SortKey::Name, SortOrder::Asc).unwrap();

    let names: Vec<_> = page.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["sub", "a.txt"], "directories first, then name ascending");
    assert_eq!(page.total_files, 1);
    assert_eq!(page.total_size_bytes, 10);
    assert_eq!(page.display_path, "/");
}

#[test]
fn test_browse_subfolder() {
    let dir = scenario_tree();
    let service = service_with(&dir, Settings::default());

    let page = service
        .browse(Some("sub"), SortKey::Name, SortOrder::Asc)
        .unwrap();
    assert_eq!(page.display_path, "/sub");
    let names: Vec<_> = page.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["b.txt"]);
}

#[test]
fn test_browse_traversal_rejected_as_not_found() {
    let dir = scenario_tree();
    let service = service_with(&dir, Settings::default());

    for raw in ["../../etc", "....//etc", "sub/../../etc"] {
        let err = service
            .browse(Some(raw), SortKey::Name, SortOrder::Asc)
            .unwrap_err();
        assert!(
            matches!(err, BrowseError::NotFound),
            "raw input {raw:?} must surface as not-found"
        );
    }
}

#[test]
fn test_browse_through_file_component_is_not_found() {
    // A request routing through a regular file (ENOTDIR on resolution)
    // must be indistinguishable from a missing path.
    let dir = scenario_tree();
    let service = service_with(&dir, Settings::default());

    let err = service
        .browse(Some("a.txt/../../x"), SortKey::Name, SortOrder::Asc)
        .unwrap_err();
    assert!(matches!(err, BrowseError::NotFound));

    let err = service.check_hash("a.txt/nested.bin").unwrap_err();
    assert!(matches!(err, BrowseError::NotFound));
}

#[test]
fn test_check_hash_twice_is_deterministic_and_cached() {
    let dir = scenario_tree();
    let service = service_with(&dir, Settings::default());

    let first = service.check_hash("a.txt").unwrap();
    assert_eq!(service.cache().record_count().unwrap(), 1);

    let second = service.check_hash("a.txt").unwrap();
    assert_eq!(first.crc32, second.crc32);
    assert_eq!(first.md5, second.md5);
    assert_eq!(first.sha1, second.sha1);
    assert_eq!(
        service.cache().record_count().unwrap(),
        1,
        "unchanged file must not grow the cache"
    );
}

#[test]
fn test_check_hash_not_found() {
    let dir = scenario_tree();
    let service = service_with(&dir, Settings::default());
    let err = service.check_hash("sub/missing.bin").unwrap_err();
    assert!(matches!(err, BrowseError::NotFound));
}

#[test]
fn test_blocked_file_hidden_from_listing_but_hashable() {
    // The extension blocklist is a display filter, not a resolver policy:
    // a blocked file stays reachable by a direct hash-check request.
    let dir = tempdir().unwrap();
    File::create(dir.path().join("page.php"))
        .unwrap()
        .write_all(b"<?php ?>")
        .unwrap();

    let service = service_with(&dir, Settings::default());

    let page = service.browse(None, SortKey::Name, SortOrder::Asc).unwrap();
    assert!(page.entries.is_empty(), "blocked extension must not be listed");

    let check = service.check_hash("page.php").unwrap();
    assert_eq!(check.file_name, "page.php");
}

#[test]
fn test_sort_and_order_flow_through() {
    let dir = tempdir().unwrap();
    for (name, size) in [("big.bin", 300), ("small.bin", 10)] {
        File::create(dir.path().join(name))
            .unwrap()
            .write_all(&vec![0u8; size])
            .unwrap();
    }
    let service = service_with(&dir, Settings::default());

    let page = service
        .browse(None, SortKey::Size, SortOrder::Desc)
        .unwrap();
    let names: Vec<_> = page.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["big.bin", "small.bin"]);
}

#[test]
#[cfg(unix)]
fn test_symlinked_root_entry_browsable() {
    let outside = tempdir().unwrap();
    File::create(outside.path().join("ext.txt"))
        .unwrap()
        .write_all(b"external")
        .unwrap();

    let dir = tempdir().unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("mirror")).unwrap();

    let service = service_with(&dir, Settings::default());

    let page = service
        .browse(Some("mirror"), SortKey::Name, SortOrder::Asc)
        .unwrap();
    let names: Vec<_> = page.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["ext.txt"]);

    let check = service.check_hash("mirror/ext.txt").unwrap();
    assert_eq!(check.file_name, "ext.txt");
}
