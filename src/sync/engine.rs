//! One-way mirror engine.
//!
//! A pass walks the source tree level by level. At each level the replica
//! directory is ensured first, then source files are copied and
//! subdirectories are descended, and replica-only entries are removed last,
//! after every subtree below that level has finished.
//!
//! The walk keeps its own work stack instead of recursing, so tree depth is
//! not bounded by the call stack.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::debug;

use crate::sync::compare::TreeComparator;
use crate::sync::error::{Result, SyncError};
use crate::sync::exclude::ExcludePatterns;
use crate::sync::hash::{ContentHasher, DigestSource, HashAlgorithm};
use crate::sync::report::{PassContext, SyncAction, SyncListener, SyncReport};
use crate::sync::snapshot::{DirectorySnapshot, EntryKind, LinkPolicy, Unreadable};

/// Sync configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Algorithm used to compare file contents.
    pub algorithm: HashAlgorithm,
    /// Entries hidden from the pass on both sides.
    pub exclude: ExcludePatterns,
    /// Report what would change without touching the replica.
    pub dry_run: bool,
}

/// Mirrors a source tree onto a replica tree.
///
/// The engine holds no state between passes; every call to
/// [`SyncEngine::synchronize`] starts from fresh listings.
#[derive(Debug, Clone)]
pub struct SyncEngine<H = ContentHasher> {
    comparator: TreeComparator<H>,
    exclude: ExcludePatterns,
    dry_run: bool,
}

impl SyncEngine<ContentHasher> {
    pub fn new(config: SyncConfig) -> Self {
        let hasher = ContentHasher::new(config.algorithm);
        Self::with_hasher(hasher, config)
    }
}

impl Default for SyncEngine<ContentHasher> {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

enum Task {
    /// Process one directory level.
    Enter { rel: PathBuf, ancestors: Vec<PathBuf> },
    /// Remove a level's replica-only entries once its subtrees are done.
    Finish {
        rel: PathBuf,
        removals: Vec<(OsString, EntryKind)>,
    },
}

impl<H: DigestSource> SyncEngine<H> {
    /// Build an engine around a custom digest source.
    ///
    /// `config.algorithm` is ignored; the hasher decides.
    pub fn with_hasher(hasher: H, config: SyncConfig) -> Self {
        Self {
            comparator: TreeComparator::new(hasher),
            exclude: config.exclude,
            dry_run: config.dry_run,
        }
    }

    pub fn comparator(&self) -> &TreeComparator<H> {
        &self.comparator
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run one pass.
    ///
    /// Fails if `source` is not a directory, or if any directory cannot be
    /// listed or created. File-level failures are handed to
    /// `listener.on_error` and the pass continues.
    pub fn synchronize(
        &self,
        source: &Path,
        replica: &Path,
        listener: &mut dyn SyncListener,
    ) -> Result<SyncReport> {
        match fs::metadata(source) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(SyncError::SourceNotDirectory {
                    path: source.to_path_buf(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SyncError::SourceNotDirectory {
                    path: source.to_path_buf(),
                })
            }
            Err(e) => return Err(SyncError::directory(e, "reading source directory", source)),
        }

        let context = PassContext {
            source: source.to_path_buf(),
            replica: replica.to_path_buf(),
            dry_run: self.dry_run,
        };

        let mut pass = Pass {
            engine: self,
            report: SyncReport::start(context.clone()),
            context,
            listener,
        };

        let mut stack = vec![Task::Enter {
            rel: PathBuf::new(),
            ancestors: Vec::new(),
        }];

        while let Some(task) = stack.pop() {
            match task {
                Task::Enter { rel, ancestors } => pass.enter(rel, ancestors, &mut stack)?,
                Task::Finish { rel, removals } => pass.finish(&rel, removals)?,
            }
        }

        let mut report = pass.report;
        report.finish();
        Ok(report)
    }
}

/// State of a single pass in progress.
struct Pass<'e, 'l, H> {
    engine: &'e SyncEngine<H>,
    context: PassContext,
    report: SyncReport,
    listener: &'l mut dyn SyncListener,
}

impl<H: DigestSource> Pass<'_, '_, H> {
    fn dry_run(&self) -> bool {
        self.engine.dry_run
    }

    fn record(&mut self, action: SyncAction) {
        self.listener.on_action(&self.context, &action);
        self.report.push(action);
    }

    /// Report a non-fatal error to the listener, or propagate a fatal one.
    fn skip(&mut self, error: SyncError) -> Result<()> {
        if error.is_fatal() {
            return Err(error);
        }
        self.listener.on_error(&self.context, &error);
        Ok(())
    }

    fn skip_unreadable(&mut self, unreadable: Unreadable) -> Result<()> {
        for error in unreadable.errors {
            self.skip(error)?;
        }
        Ok(())
    }

    fn enter(&mut self, rel: PathBuf, mut ancestors: Vec<PathBuf>, stack: &mut Vec<Task>) -> Result<()> {
        let source_dir = self.context.source_path(&rel);
        let replica_dir = self.context.replica_path(&rel);

        let canonical = fs::canonicalize(&source_dir)
            .map_err(|e| SyncError::directory(e, "resolving directory", &source_dir))?;
        if ancestors.contains(&canonical) {
            return self.skip(SyncError::SymlinkCycle { path: source_dir });
        }

        debug!(level = %rel.display(), "entering directory");
        let replica_present = self.ensure_dir(&rel, &replica_dir)?;

        let (source, unreadable) = DirectorySnapshot::read(&source_dir, LinkPolicy::Follow)?;
        self.skip_unreadable(unreadable)?;

        let replica = if replica_present {
            let (replica, unreadable) = DirectorySnapshot::read(&replica_dir, LinkPolicy::NoFollow)?;
            self.skip_unreadable(unreadable)?;
            replica
        } else {
            DirectorySnapshot::new()
        };

        let source = source.without_excluded(&rel, &self.engine.exclude);
        let replica = replica.without_excluded(&rel, &self.engine.exclude);
        let diff = self.engine.comparator.diff(&source, &replica);

        let mut subdirs = Vec::new();
        for (name, kind) in source.iter() {
            let child = rel.join(name);
            let replica_kind = if diff.in_both.contains(name) {
                replica.kind(name)
            } else {
                None
            };

            if kind.is_dir() {
                if let Some(existing) = replica_kind.filter(|k| !k.is_dir()) {
                    self.remove(&child, existing)?;
                }
                subdirs.push(child);
            } else {
                self.sync_file(&child, replica_kind, replica_present)?;
            }
        }

        let removals = diff
            .only_in_replica
            .into_iter()
            .filter_map(|name| replica.kind(&name).map(|kind| (name, kind)))
            .collect();
        stack.push(Task::Finish {
            rel: rel.clone(),
            removals,
        });

        ancestors.push(canonical);
        for child in subdirs.into_iter().rev() {
            stack.push(Task::Enter {
                rel: child,
                ancestors: ancestors.clone(),
            });
        }

        Ok(())
    }

    fn finish(&mut self, rel: &Path, removals: Vec<(OsString, EntryKind)>) -> Result<()> {
        for (name, kind) in removals {
            self.remove(&rel.join(name), kind)?;
        }
        Ok(())
    }

    /// Make sure the replica directory for `rel` exists.
    ///
    /// Returns whether it existed before this call.
    fn ensure_dir(&mut self, rel: &Path, replica_dir: &Path) -> Result<bool> {
        // The replica root may itself be a link to a directory; nested links never are.
        let existing = if rel.as_os_str().is_empty() {
            fs::metadata(replica_dir)
        } else {
            fs::symlink_metadata(replica_dir)
        };

        match existing {
            Ok(metadata) if metadata.is_dir() => return Ok(true),
            // In dry-run mode a conflicting entry was only reported as removed.
            Ok(_) if self.dry_run() && !rel.as_os_str().is_empty() => {}
            Ok(_) => {
                return Err(SyncError::directory(
                    io::Error::new(io::ErrorKind::AlreadyExists, "path exists and is not a directory"),
                    "creating directory",
                    replica_dir,
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::directory(e, "reading directory metadata", replica_dir)),
        }

        if !self.dry_run() {
            fs::create_dir_all(replica_dir)
                .map_err(|e| SyncError::directory(e, "creating directory", replica_dir))?;
        }
        self.record(SyncAction::CreateDir {
            path: rel.to_path_buf(),
        });

        Ok(false)
    }

    fn sync_file(&mut self, rel: &Path, replica_kind: Option<EntryKind>, replica_present: bool) -> Result<()> {
        let needs_copy = match replica_kind {
            Some(kind @ (EntryKind::Directory | EntryKind::Symlink)) => {
                if !self.remove(rel, kind)? {
                    return Ok(());
                }
                true
            }
            _ if !replica_present => true,
            _ => {
                let source_file = self.context.source_path(rel);
                let replica_file = self.context.replica_path(rel);
                match self.engine.comparator.needs_copy(&source_file, &replica_file) {
                    Ok(needed) => needed,
                    Err(e) => return self.skip(e),
                }
            }
        };

        if needs_copy {
            self.copy_file(rel)?;
        }
        Ok(())
    }

    fn copy_file(&mut self, rel: &Path) -> Result<()> {
        let source_file = self.context.source_path(rel);
        let replica_file = self.context.replica_path(rel);

        let bytes = if self.dry_run() {
            match fs::metadata(&source_file) {
                Ok(metadata) => metadata.len(),
                Err(e) => return self.skip(SyncError::io(e, "reading metadata", source_file)),
            }
        } else {
            let bytes = match fs::copy(&source_file, &replica_file) {
                Ok(bytes) => bytes,
                Err(e) => return self.skip(SyncError::io(e, "copying file", source_file)),
            };
            if let Err(e) = copy_modified_time(&source_file, &replica_file) {
                self.skip(SyncError::io(e, "setting modification time", &replica_file))?;
            }
            bytes
        };

        self.record(SyncAction::CopyFile {
            path: rel.to_path_buf(),
            bytes,
        });
        Ok(())
    }

    /// Remove a replica entry. Returns whether it is gone.
    fn remove(&mut self, rel: &Path, kind: EntryKind) -> Result<bool> {
        let path = self.context.replica_path(rel);

        if !self.dry_run() {
            let (result, operation) = match kind {
                EntryKind::Directory => (fs::remove_dir_all(&path), "removing directory tree"),
                EntryKind::File => (fs::remove_file(&path), "removing file"),
                // Directory links on Windows need remove_dir.
                EntryKind::Symlink => (
                    fs::remove_file(&path).or_else(|_| fs::remove_dir(&path)),
                    "removing symlink",
                ),
            };
            if let Err(e) = result {
                self.skip(SyncError::io(e, operation, path))?;
                return Ok(false);
            }
        }

        let path = rel.to_path_buf();
        self.record(match kind {
            EntryKind::Directory => SyncAction::RemoveDir { path },
            EntryKind::File | EntryKind::Symlink => SyncAction::RemoveFile { path },
        });
        Ok(true)
    }
}

/// By path: `fs::copy` keeps permission bits, so the replica may be read-only.
fn copy_modified_time(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::metadata(from)?;
    filetime::set_file_mtime(to, FileTime::from_last_modification_time(&metadata))
}
