//! Command-line configuration.
//!
//! Flags are parsed with clap and validated into a [`DriverConfig`] for the
//! scheduling loop and a [`SyncConfig`] for the engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};

use crate::sync::{ExcludePatterns, HashAlgorithm, SyncConfig, SyncError};

#[derive(Debug, Parser)]
#[command(name = "foldersync", version)]
#[command(about = "Periodically mirror a source folder onto a replica folder")]
pub struct Cli {
    /// Path to the source folder
    #[arg(long, value_name = "DIR")]
    pub source: PathBuf,

    /// Path to the replica folder (created if missing)
    #[arg(long, value_name = "DIR")]
    pub replica: PathBuf,

    /// Synchronization interval in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Path to the log file (appended to)
    #[arg(long = "log-file", alias = "log_file", value_name = "PATH")]
    pub log_file: PathBuf,

    /// Hash algorithm used to compare file contents
    #[arg(long = "hash", value_name = "ALG", default_value_t = HashAlgorithm::Blake3)]
    pub hash: HashAlgorithm,

    /// Glob pattern to leave out of the mirror (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Read exclude patterns from a gitignore-style file
    #[arg(long, value_name = "PATH")]
    pub exclude_from: Option<PathBuf>,

    /// Log what would change without modifying the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Settings for the scheduling loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub interval: Duration,
    pub once: bool,
}

/// Fully validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub driver: DriverConfig,
    pub sync: SyncConfig,
    pub log_file: PathBuf,
    pub verbose: u8,
}

impl Cli {
    /// Validate flags and load exclude patterns.
    pub fn into_config(self) -> Result<Config> {
        if !self.source.is_dir() {
            return Err(SyncError::SourceNotDirectory { path: self.source }.into());
        }
        check_disjoint(&self.source, &self.replica)?;

        let mut exclude = ExcludePatterns::from_patterns(self.exclude.as_slice())?;
        if let Some(path) = &self.exclude_from {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read exclude file: {}", path.display()))?;
            for pattern in ExcludePatterns::parse_ignore_file(&content)?.patterns() {
                exclude.add_pattern(pattern)?;
            }
        }

        Ok(Config {
            driver: DriverConfig {
                source: self.source,
                replica: self.replica,
                interval: Duration::from_secs(self.interval),
                once: self.once,
            },
            sync: SyncConfig {
                algorithm: self.hash,
                exclude,
                dry_run: self.dry_run,
            },
            log_file: self.log_file,
            verbose: self.verbose,
        })
    }
}

/// Reject a replica inside the source (it would mirror itself) and a source
/// inside the replica (the pass would delete it).
fn check_disjoint(source: &Path, replica: &Path) -> Result<()> {
    let source = resolve(source);
    let replica = resolve(replica);

    if replica.starts_with(&source) || source.starts_with(&replica) {
        bail!(
            "source {} and replica {} must not contain each other",
            source.display(),
            replica.display()
        );
    }
    Ok(())
}

/// Canonicalize a path that may not exist yet by resolving its parent.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => resolve(parent).join(name),
        _ => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}
