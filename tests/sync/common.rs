// Shared fixtures for sync tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use foldersync::sync::{
    ContentHasher, Digest, DigestSource, PassContext, SyncAction, SyncConfig, SyncEngine,
    SyncError, SyncListener, SyncReport,
};
use tempfile::TempDir;

/// A source and replica directory under one temporary root.
///
/// The replica is not created; tests that need it call `create_replica`.
pub struct Fixture {
    _dir: TempDir,
    pub source: PathBuf,
    pub replica: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let replica = dir.path().join("replica");
        fs::create_dir(&source).unwrap();
        Self {
            _dir: dir,
            source,
            replica,
        }
    }

    pub fn create_replica(&self) -> &Self {
        fs::create_dir_all(&self.replica).unwrap();
        self
    }

    pub fn source_file(&self, rel: &str, content: &str) -> &Self {
        write_file(&self.source.join(rel), content);
        self
    }

    pub fn replica_file(&self, rel: &str, content: &str) -> &Self {
        write_file(&self.replica.join(rel), content);
        self
    }

    pub fn source_dir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.source.join(rel)).unwrap();
        self
    }

    pub fn replica_dir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.replica.join(rel)).unwrap();
        self
    }

    /// Run one pass with the default engine.
    pub fn sync(&self) -> (SyncReport, RecordingListener) {
        self.sync_with(SyncEngine::default())
    }

    pub fn sync_config(&self, config: SyncConfig) -> (SyncReport, RecordingListener) {
        self.sync_with(SyncEngine::new(config))
    }

    pub fn sync_with<H: DigestSource>(&self, engine: SyncEngine<H>) -> (SyncReport, RecordingListener) {
        let mut listener = RecordingListener::default();
        let report = engine
            .synchronize(&self.source, &self.replica, &mut listener)
            .unwrap();
        (report, listener)
    }

    pub fn replica_content(&self, rel: &str) -> String {
        fs::read_to_string(self.replica.join(rel)).unwrap()
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Every path under `root`, mapped to its content (`None` for directories).
pub fn tree(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    let mut entries = BTreeMap::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(rel) = pending.pop() {
        for entry in fs::read_dir(root.join(&rel)).unwrap() {
            let entry = entry.unwrap();
            let child = rel.join(entry.file_name());
            if entry.file_type().unwrap().is_dir() {
                entries.insert(child.clone(), None);
                pending.push(child);
            } else {
                entries.insert(child, Some(fs::read(entry.path()).unwrap()));
            }
        }
    }

    entries
}

/// Listener that keeps everything it is told.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub actions: Vec<SyncAction>,
    pub lines: Vec<String>,
    pub errors: Vec<String>,
}

impl SyncListener for RecordingListener {
    fn on_action(&mut self, pass: &PassContext, action: &SyncAction) {
        self.actions.push(action.clone());
        self.lines.push(action.describe(pass));
    }

    fn on_error(&mut self, _pass: &PassContext, error: &SyncError) {
        self.errors.push(error.to_string());
    }
}

/// Digest source that records which files were hashed.
#[derive(Debug, Default)]
pub struct CountingHasher {
    inner: ContentHasher,
    pub hashed: RefCell<Vec<PathBuf>>,
}

impl CountingHasher {
    pub fn hashed_names(&self) -> Vec<String> {
        self.hashed
            .borrow()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }
}

impl DigestSource for CountingHasher {
    fn digest(&self, path: &Path) -> Result<Digest, SyncError> {
        self.hashed.borrow_mut().push(path.to_path_buf());
        self.inner.digest(path)
    }
}

impl DigestSource for &CountingHasher {
    fn digest(&self, path: &Path) -> Result<Digest, SyncError> {
        (**self).digest(path)
    }
}

/// Shorthand for relative action paths.
pub fn rel(path: &str) -> PathBuf {
    PathBuf::from(path)
}
