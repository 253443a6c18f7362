//! Single-level directory listings.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

use crate::sync::error::{Result, SyncError};
use crate::sync::exclude::ExcludePatterns;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// A link that was not followed. Only produced for replica listings.
    Symlink,
}

impl EntryKind {
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// How symlinks are treated while listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Classify entries by what links point at.
    Follow,
    /// Classify links as [`EntryKind::Symlink`].
    NoFollow,
}

/// Entry names directly inside one directory, tagged with their kind.
///
/// Names are kept as raw OS strings, so names that are not valid UTF-8
/// round-trip unchanged. They iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    entries: BTreeMap<OsString, EntryKind>,
}

/// Entries that could not be classified during a listing.
#[derive(Debug, Default)]
pub struct Unreadable {
    pub errors: Vec<SyncError>,
}

impl DirectorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// List `path`.
    ///
    /// Failure to open or iterate the directory is a `DirectoryAccess` error.
    /// Entries whose metadata cannot be read (for example a dangling symlink
    /// under [`LinkPolicy::Follow`]) are left out and returned separately.
    pub fn read(path: &Path, links: LinkPolicy) -> Result<(Self, Unreadable)> {
        let read_dir =
            fs::read_dir(path).map_err(|e| SyncError::directory(e, "listing directory", path))?;

        let mut snapshot = Self::new();
        let mut unreadable = Unreadable::default();

        for entry in read_dir {
            let entry = entry.map_err(|e| SyncError::directory(e, "listing directory", path))?;
            let entry_path = entry.path();
            let name = entry.file_name();

            match classify(&entry_path, links) {
                Ok(kind) => {
                    snapshot.entries.insert(name, kind);
                }
                Err(e) => unreadable
                    .errors
                    .push(SyncError::io(e, "reading metadata", entry_path)),
            }
        }

        Ok((snapshot, unreadable))
    }

    pub fn insert(&mut self, name: impl Into<OsString>, kind: EntryKind) {
        self.entries.insert(name.into(), kind);
    }

    pub fn kind(&self, name: impl AsRef<OsStr>) -> Option<EntryKind> {
        self.entries.get(name.as_ref()).copied()
    }

    pub fn contains(&self, name: impl AsRef<OsStr>) -> bool {
        self.entries.contains_key(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &OsStr> {
        self.entries.keys().map(OsString::as_os_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, EntryKind)> {
        self.entries.iter().map(|(name, kind)| (name.as_os_str(), *kind))
    }

    /// Drop entries whose path under `rel_dir` matches an exclude pattern.
    pub fn without_excluded(mut self, rel_dir: &Path, excludes: &ExcludePatterns) -> Self {
        if excludes.is_empty() {
            return self;
        }
        self.entries
            .retain(|name, _| !excludes.is_excluded_path(&rel_dir.join(name)));
        self
    }
}

fn classify(path: &Path, links: LinkPolicy) -> io::Result<EntryKind> {
    let metadata = match links {
        LinkPolicy::Follow => fs::metadata(path)?,
        LinkPolicy::NoFollow => fs::symlink_metadata(path)?,
    };
    let file_type = metadata.file_type();

    Ok(if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    })
}
