//! Actions emitted during a pass, and the listener that logs them.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::sync::error::SyncError;

/// One mutation applied to the replica.
///
/// Paths are relative to the tree roots; the replica root itself is the
/// empty path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    CreateDir { path: PathBuf },
    CopyFile { path: PathBuf, bytes: u64 },
    RemoveFile { path: PathBuf },
    RemoveDir { path: PathBuf },
}

impl SyncAction {
    pub fn path(&self) -> &Path {
        match self {
            SyncAction::CreateDir { path }
            | SyncAction::CopyFile { path, .. }
            | SyncAction::RemoveFile { path }
            | SyncAction::RemoveDir { path } => path,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            SyncAction::CreateDir { .. } => ActionKind::CreateDir,
            SyncAction::CopyFile { .. } => ActionKind::CopyFile,
            SyncAction::RemoveFile { .. } => ActionKind::RemoveFile,
            SyncAction::RemoveDir { .. } => ActionKind::RemoveDir,
        }
    }

    /// Human-readable line with full paths.
    pub fn describe(&self, pass: &PassContext) -> String {
        let line = match self {
            SyncAction::CreateDir { path } => {
                format!("Created directory: {}", pass.replica_path(path).display())
            }
            SyncAction::CopyFile { path, bytes } => format!(
                "Copied/Updated file: {} -> {} ({})",
                pass.source_path(path).display(),
                pass.replica_path(path).display(),
                humansize::format_size(*bytes, humansize::BINARY)
            ),
            SyncAction::RemoveFile { path } => {
                format!("Removed file: {}", pass.replica_path(path).display())
            }
            SyncAction::RemoveDir { path } => {
                format!("Removed directory: {}", pass.replica_path(path).display())
            }
        };

        if pass.dry_run {
            format!("[dry-run] {}", line)
        } else {
            line
        }
    }
}

/// Action tag without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateDir,
    CopyFile,
    RemoveFile,
    RemoveDir,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::CreateDir => "CREATE_DIR",
            ActionKind::CopyFile => "COPY_FILE",
            ActionKind::RemoveFile => "REMOVE_FILE",
            ActionKind::RemoveDir => "REMOVE_DIR",
        };
        f.write_str(name)
    }
}

/// Roots and mode of the pass in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassContext {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub dry_run: bool,
}

impl PassContext {
    pub fn source_path(&self, rel: &Path) -> PathBuf {
        join_rel(&self.source, rel)
    }

    pub fn replica_path(&self, rel: &Path) -> PathBuf {
        join_rel(&self.replica, rel)
    }
}

// `Path::join("")` would append a trailing separator.
fn join_rel(root: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    }
}

/// Per-kind action counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub dirs_created: usize,
    pub files_copied: usize,
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub bytes_copied: u64,
}

impl SyncSummary {
    pub fn total(&self) -> usize {
        self.dirs_created + self.files_copied + self.files_removed + self.dirs_removed
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dirs created, {} files copied ({}), {} files removed, {} dirs removed",
            self.dirs_created,
            self.files_copied,
            humansize::format_size(self.bytes_copied, humansize::BINARY),
            self.files_removed,
            self.dirs_removed
        )
    }
}

/// Ordered log of the actions taken by one pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    #[serde(flatten)]
    pass: PassContext,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    actions: Vec<SyncAction>,
}

impl SyncReport {
    pub(crate) fn start(pass: PassContext) -> Self {
        Self {
            pass,
            started_at: Utc::now(),
            finished_at: None,
            actions: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, action: SyncAction) {
        self.actions.push(action);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn pass(&self) -> &PassContext {
        &self.pass
    }

    pub fn is_dry_run(&self) -> bool {
        self.pass.dry_run
    }

    pub fn actions(&self) -> &[SyncAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(SyncAction::kind).collect()
    }

    pub fn bytes_copied(&self) -> u64 {
        self.summary().bytes_copied
    }

    pub fn summary(&self) -> SyncSummary {
        let mut summary = SyncSummary::default();
        for action in &self.actions {
            match action {
                SyncAction::CreateDir { .. } => summary.dirs_created += 1,
                SyncAction::CopyFile { bytes, .. } => {
                    summary.files_copied += 1;
                    summary.bytes_copied += bytes;
                }
                SyncAction::RemoveFile { .. } => summary.files_removed += 1,
                SyncAction::RemoveDir { .. } => summary.dirs_removed += 1,
            }
        }
        summary
    }

    /// One line per action, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.describe(&self.pass)).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Receives actions and skipped failures as a pass runs.
pub trait SyncListener {
    fn on_action(&mut self, pass: &PassContext, action: &SyncAction);

    fn on_error(&mut self, _pass: &PassContext, _error: &SyncError) {}
}

/// Logs every action at info and every skipped failure at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl SyncListener for TracingListener {
    fn on_action(&mut self, pass: &PassContext, action: &SyncAction) {
        info!("{}", action.describe(pass));
    }

    fn on_error(&mut self, _pass: &PassContext, error: &SyncError) {
        warn!("Skipped: {}", error);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl SyncListener for NoopListener {
    fn on_action(&mut self, _pass: &PassContext, _action: &SyncAction) {}
}
