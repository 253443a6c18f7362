// Convergence, idempotence and deletion propagation over mixed trees

use std::fs;

use foldersync::sync::{ActionKind, SyncAction};

use crate::common::{rel, tree, Fixture};

fn populate(fixture: &Fixture) {
    fixture
        .source_file("readme.md", "# hello")
        .source_file("src/main.rs", "fn main() {}")
        .source_file("src/lib/mod.rs", "pub mod a;")
        .source_file("assets/logo.bin", "\u{0}\u{1}\u{2}")
        .source_dir("empty/leaf")
        .replica_file("readme.md", "# stale")
        .replica_file("src/main.rs", "fn main() {}")
        .replica_file("src/old.rs", "// removed")
        .replica_file("build/out/artifact", "binary")
        .replica_dir("empty/leaf/extra");
}

#[test]
fn test_convergence() {
    let fixture = Fixture::new();
    populate(&fixture);

    fixture.sync();

    assert_eq!(tree(&fixture.source), tree(&fixture.replica));
}

#[test]
fn test_idempotence() {
    let fixture = Fixture::new();
    populate(&fixture);

    let (first, _) = fixture.sync();
    assert!(!first.is_empty());

    let (second, _) = fixture.sync();
    assert!(second.is_empty(), "unexpected actions: {:?}", second.actions());
}

#[test]
fn test_idempotence_from_missing_replica() {
    let fixture = Fixture::new();
    fixture.source_file("a/b/c.txt", "c");

    let (first, _) = fixture.sync();
    assert_eq!(first.actions()[0].kind(), ActionKind::CreateDir);
    assert_eq!(first.actions()[0].path(), rel(""));

    let (second, _) = fixture.sync();
    assert!(second.is_empty());
}

#[test]
fn test_deletion_propagation() {
    let fixture = Fixture::new();
    populate(&fixture);

    let (report, _) = fixture.sync();

    for gone in ["src/old.rs", "build", "empty/leaf/extra"] {
        assert!(!fixture.replica.join(gone).exists(), "{} still present", gone);
    }

    // One removal per replica-only root, nothing for its contents.
    let removed_dirs: Vec<_> = report
        .actions()
        .iter()
        .filter(|a| a.kind() == ActionKind::RemoveDir)
        .map(|a| a.path().to_path_buf())
        .collect();
    assert_eq!(removed_dirs, vec![rel("empty/leaf/extra"), rel("build")]);
}

#[test]
fn test_source_changes_between_passes() {
    let fixture = Fixture::new();
    populate(&fixture);
    fixture.sync();

    fs::write(fixture.source.join("src/main.rs"), "fn main() { run() }").unwrap();
    fs::remove_dir_all(fixture.source.join("assets")).unwrap();
    fixture.source_file("docs/guide.md", "guide");

    let (report, _) = fixture.sync();

    assert_eq!(
        report.actions(),
        &[
            SyncAction::CreateDir { path: rel("docs") },
            SyncAction::CopyFile {
                path: rel("docs/guide.md"),
                bytes: 5
            },
            SyncAction::CopyFile {
                path: rel("src/main.rs"),
                bytes: 19
            },
            SyncAction::RemoveDir {
                path: rel("assets")
            },
        ]
    );
    assert_eq!(tree(&fixture.source), tree(&fixture.replica));
}

#[test]
fn test_summary_matches_actions() {
    let fixture = Fixture::new();
    populate(&fixture);

    let (report, _) = fixture.sync();
    let summary = report.summary();

    assert_eq!(summary.total(), report.len());
    assert_eq!(summary.files_removed, 1);
    assert_eq!(summary.dirs_removed, 2);
    assert_eq!(summary.files_copied, 3);
    assert!(report.finished_at().unwrap() >= report.started_at());
}
