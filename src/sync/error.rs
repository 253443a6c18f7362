//! Error types for synchronization passes.
//!
//! Directory-level failures abort a pass; file-level failures are reported
//! to the listener and the pass carries on with the remaining entries.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while mirroring a source tree onto a replica.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source root is missing or is not a directory.
    #[error("source is not a directory: {}", .path.display())]
    SourceNotDirectory { path: PathBuf },

    /// A directory could not be listed or created.
    #[error("cannot access directory {} while {operation}: {source}", .path.display())]
    DirectoryAccess {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A file could not be opened, read, copied or removed.
    #[error("I/O error on {} while {operation}: {source}", .path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A followed source symlink points back at one of its ancestors.
    #[error("symlink cycle detected at {}", .path.display())]
    SymlinkCycle { path: PathBuf },

    #[error("unsupported hash algorithm: {algorithm} (expected blake3, md5, sha256 or xxh128)")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl SyncError {
    /// Build an error for a failed file operation.
    pub fn io(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        SyncError::Io {
            path: path.into(),
            operation: operation.to_string(),
            source: err,
        }
    }

    /// Build an error for a failed directory listing or creation.
    pub fn directory(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        SyncError::DirectoryAccess {
            path: path.into(),
            operation: operation.to_string(),
            source: err,
        }
    }

    /// Whether this error must abort the whole pass.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::SourceNotDirectory { .. } | SyncError::DirectoryAccess { .. }
        )
    }

    /// The path the error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            SyncError::SourceNotDirectory { path }
            | SyncError::DirectoryAccess { path, .. }
            | SyncError::Io { path, .. }
            | SyncError::SymlinkCycle { path } => Some(path),
            SyncError::UnsupportedAlgorithm { .. } | SyncError::InvalidPattern { .. } => None,
        }
    }

    /// The underlying I/O error kind, if this wraps one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            SyncError::DirectoryAccess { source, .. } | SyncError::Io { source, .. } => {
                Some(source.kind())
            }
            _ => None,
        }
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
