//! Source/replica comparison.
//!
//! [`TreeComparator::diff`] partitions two listings by name only;
//! [`TreeComparator::needs_copy`] is the single place where file content is
//! compared.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

use tracing::trace;

use crate::sync::error::{Result, SyncError};
use crate::sync::hash::{ContentHasher, DigestSource};
use crate::sync::snapshot::DirectorySnapshot;

/// Name partition of one directory level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    pub only_in_source: BTreeSet<OsString>,
    pub only_in_replica: BTreeSet<OsString>,
    pub in_both: BTreeSet<OsString>,
}

impl TreeDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_source.is_empty() && self.only_in_replica.is_empty() && self.in_both.is_empty()
    }
}

/// Compares directory listings and file contents.
#[derive(Debug, Clone, Default)]
pub struct TreeComparator<H = ContentHasher> {
    hasher: H,
}

impl<H: DigestSource> TreeComparator<H> {
    pub fn new(hasher: H) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Partition entry names into source-only, replica-only and shared.
    pub fn diff(&self, source: &DirectorySnapshot, replica: &DirectorySnapshot) -> TreeDiff {
        let mut diff = TreeDiff::default();

        for name in source.names() {
            if replica.contains(name) {
                diff.in_both.insert(name.to_os_string());
            } else {
                diff.only_in_source.insert(name.to_os_string());
            }
        }

        for name in replica.names() {
            if !source.contains(name) {
                diff.only_in_replica.insert(name.to_os_string());
            }
        }

        diff
    }

    /// Whether `source_file` has to be copied over `replica_file`.
    ///
    /// A missing replica returns `true` without hashing anything.
    pub fn needs_copy(&self, source_file: &Path, replica_file: &Path) -> Result<bool> {
        match fs::symlink_metadata(replica_file) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(SyncError::io(e, "reading metadata", replica_file)),
            Ok(_) => {}
        }

        let source_digest = self.hasher.digest(source_file)?;
        let replica_digest = self.hasher.digest(replica_file)?;
        trace!(
            source = %source_file.display(),
            source_digest = %source_digest,
            replica_digest = %replica_digest,
            "compared digests"
        );

        Ok(source_digest != replica_digest)
    }
}
