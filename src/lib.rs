// Library module for foldersync
// Re-exports modules for use in integration tests and the binary

pub mod config;
pub mod driver;
pub mod logging;
pub mod sync;

use std::path::Path;

pub use sync::{SyncAction, SyncEngine, SyncError, SyncReport};

/// Mirror `source` onto `replica` once with default settings.
///
/// Uses BLAKE3, no exclude patterns, and logs every action through `tracing`.
pub fn synchronize(
    source: impl AsRef<Path>,
    replica: impl AsRef<Path>,
) -> Result<SyncReport, SyncError> {
    SyncEngine::default().synchronize(
        source.as_ref(),
        replica.as_ref(),
        &mut sync::TracingListener,
    )
}
