//! Sync & Replication Module
//!
//! One-way mirroring of a source tree onto a replica: content hashing,
//! directory comparison, the mirror engine and its action report.

pub mod compare;
pub mod engine;
pub mod error;
pub mod exclude;
pub mod hash;
pub mod report;
pub mod snapshot;

pub use compare::{TreeComparator, TreeDiff};
pub use engine::{SyncConfig, SyncEngine};
pub use error::SyncError;
pub use exclude::ExcludePatterns;
pub use hash::{ContentHasher, Digest, DigestSource, HashAlgorithm};
pub use report::{
    ActionKind, NoopListener, PassContext, SyncAction, SyncListener, SyncReport, SyncSummary,
    TracingListener,
};
pub use snapshot::{DirectorySnapshot, EntryKind, LinkPolicy};
