//! Exclude pattern matching.
//!
//! Excluded entries are invisible to a pass: they are not copied from the
//! source and not removed from the replica.

use std::path::{Component, Path};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::sync::error::{Result, SyncError};

/// Compiled set of glob patterns.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    glob_set: GlobSet,
    patterns: Vec<String>,
}

impl Default for ExcludePatterns {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcludePatterns {
    /// Empty set; nothing is excluded.
    pub fn new() -> Self {
        Self {
            glob_set: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut excludes = Self::new();
        for pattern in patterns {
            excludes.patterns.push(pattern.as_ref().to_string());
        }
        excludes.rebuild()?;
        Ok(excludes)
    }

    /// Parse gitignore-style content: one pattern per line, `#` comments.
    ///
    /// Negations (`!pattern`) are not supported and are skipped. A trailing
    /// `/` is dropped since matching is by name.
    pub fn parse_ignore_file(content: &str) -> Result<Self> {
        let patterns: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
            .map(|line| line.trim_end_matches('/'))
            .filter(|line| !line.is_empty())
            .collect();

        Self::from_patterns(patterns.as_slice())
    }

    pub fn add_pattern(&mut self, pattern: &str) -> Result<()> {
        self.patterns.push(pattern.to_string());
        if let Err(e) = self.rebuild() {
            self.patterns.pop();
            return Err(e);
        }
        Ok(())
    }

    fn rebuild(&mut self) -> Result<()> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.patterns {
            let glob = Glob::new(pattern).map_err(|source| SyncError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        self.glob_set = builder.build().map_err(|source| SyncError::InvalidPattern {
            pattern: self.patterns.join(", "),
            source,
        })?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check a relative path against the set.
    ///
    /// Matches the whole path, then each component, so `target` excludes
    /// `target` as well as `crates/x/target`.
    pub fn is_excluded_path(&self, path: &Path) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.glob_set.is_match(path) {
            return true;
        }

        path.components().any(|component| match component {
            Component::Normal(name) => self.glob_set.is_match(name),
            _ => false,
        })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.is_excluded_path(Path::new(path))
    }
}
