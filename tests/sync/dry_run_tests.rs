// Dry-run passes report without mutating the replica

use foldersync::sync::{SyncConfig, SyncEngine};

use crate::common::{tree, Fixture};

fn dry_run() -> SyncConfig {
    SyncConfig {
        dry_run: true,
        ..SyncConfig::default()
    }
}

#[test]
fn test_dry_run_matches_real_pass() {
    let planned = Fixture::new();
    let applied = Fixture::new();
    for fixture in [&planned, &applied] {
        fixture
            .source_file("a.txt", "A")
            .source_file("dir/b.txt", "B")
            .source_file("swap", "file in source")
            .replica_file("swap/x.txt", "dir in replica")
            .replica_file("dir/c.txt", "C")
            .replica_file("old/d.txt", "D");
    }

    let before = tree(&planned.replica);
    let (plan, listener) = planned.sync_config(dry_run());
    let (real, _) = applied.sync();

    assert!(plan.is_dry_run());
    assert_eq!(plan.actions(), real.actions());
    assert_eq!(tree(&planned.replica), before);
    assert!(listener.lines.iter().all(|line| line.starts_with("[dry-run]")));
}

#[test]
fn test_dry_run_with_missing_replica() {
    let fixture = Fixture::new();
    fixture.source_file("nested/deeper/file.txt", "x");

    let (plan, _) = fixture.sync_config(dry_run());

    assert_eq!(plan.len(), 4);
    assert!(!fixture.replica.exists());
}

#[test]
fn test_dry_run_directory_over_replica_file() {
    let fixture = Fixture::new();
    fixture
        .source_file("thing/inside.txt", "in a dir")
        .replica_file("thing", "a file");

    let engine = SyncEngine::new(dry_run());
    assert!(engine.is_dry_run());
    let (plan, listener) = fixture.sync_with(engine);

    assert_eq!(plan.len(), 3);
    assert!(listener.errors.is_empty());
    assert_eq!(fixture.replica_content("thing"), "a file");
}
