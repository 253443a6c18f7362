// Entry names that are not valid UTF-8 are mirrored byte for byte

#![cfg(target_os = "linux")]

use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use foldersync::sync::SyncAction;

use crate::common::{tree, Fixture};

fn raw(bytes: &[u8]) -> &OsStr {
    OsStr::from_bytes(bytes)
}

#[test]
fn test_non_utf8_file_is_copied() {
    let fixture = Fixture::new();
    let name = raw(b"caf\xe9.txt");
    fs::write(fixture.source.join(name), "latin-1").unwrap();

    let (report, listener) = fixture.sync();

    assert!(listener.errors.is_empty(), "{:?}", listener.errors);
    assert!(report.actions().contains(&SyncAction::CopyFile {
        path: PathBuf::from(name),
        bytes: 7,
    }));
    assert_eq!(fs::read(fixture.replica.join(name)).unwrap(), b"latin-1");
    assert_eq!(tree(&fixture.source), tree(&fixture.replica));

    let (second, _) = fixture.sync();
    assert!(second.is_empty());
}

#[test]
fn test_non_utf8_replica_entries_are_removed() {
    let fixture = Fixture::new();
    fixture.create_replica();
    let file = raw(b"old\xff.txt");
    let dir = raw(b"gone\xfe");
    fs::write(fixture.replica.join(file), "stale").unwrap();
    fs::create_dir(fixture.replica.join(dir)).unwrap();
    fs::write(fixture.replica.join(dir).join("inner.txt"), "x").unwrap();

    let (report, listener) = fixture.sync();

    assert!(listener.errors.is_empty(), "{:?}", listener.errors);
    assert_eq!(report.len(), 2);
    assert!(!fixture.replica.join(file).exists());
    assert!(!fixture.replica.join(dir).exists());
}

#[test]
fn test_names_with_same_lossy_rendering_stay_distinct() {
    let fixture = Fixture::new();
    fs::write(fixture.source.join(raw(b"x\xe9")), "first").unwrap();
    fs::write(fixture.source.join(raw(b"x\xe8")), "second").unwrap();

    fixture.sync();

    assert_eq!(fs::read(fixture.replica.join(raw(b"x\xe9"))).unwrap(), b"first");
    assert_eq!(fs::read(fixture.replica.join(raw(b"x\xe8"))).unwrap(), b"second");
}
