//! History retention.
//!
//! Pruning is irreversible: revisions beyond the ceiling, and every object
//! only they reference, are deleted from disk. The newest `max_revisions`
//! revisions stay reachable and diff-able.

use crate::backend::VersionControlBackend;
use crate::{SnapshotError, SnapshotResult};
use serde::{Deserialize, Serialize};

/// How many revisions retention keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionConfig {
    max_revisions: usize,
}

impl RetentionConfig {
    /// Create a config; at least one revision must be kept.
    pub fn new(max_revisions: usize) -> SnapshotResult<Self> {
        if max_revisions == 0 {
            return Err(SnapshotError::InvalidRetention(max_revisions));
        }
        Ok(Self { max_revisions })
    }

    pub fn max_revisions(&self) -> usize {
        self.max_revisions
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { max_revisions: 50 }
    }
}

/// Outcome of a cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionReport {
    /// Revisions removed from history.
    pub pruned_revisions: usize,
    /// Local branches deleted.
    pub deleted_branches: usize,
    /// Stored objects deleted.
    pub removed_objects: usize,
}

/// Prunes history down to a ceiling.
#[derive(Debug, Clone, Default)]
pub struct RetentionPolicy {
    config: RetentionConfig,
}

impl RetentionPolicy {
    pub fn new(config: RetentionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> RetentionConfig {
        self.config
    }

    /// Run the policy against a backend.
    ///
    /// Divergent branches go first so their objects are swept together with
    /// the pruned history.
    pub fn apply(
        &self,
        backend: &dyn VersionControlBackend,
        prune_divergent_branches: bool,
    ) -> SnapshotResult<RetentionReport> {
        let deleted_branches = if prune_divergent_branches {
            backend.delete_divergent_branches()?
        } else {
            0
        };

        let outcome = backend.delete_old_revisions(self.config.max_revisions)?;

        Ok(RetentionReport {
            pruned_revisions: outcome.pruned_revisions,
            deleted_branches,
            removed_objects: outcome.removed_objects,
        })
    }
}
