//! Capability interface over a local version-control system.

use crate::{Revision, RevisionId, SnapshotResult};
use std::path::PathBuf;

/// Minimal version-control operations the snapshot store is built on.
///
/// Every operation works relative to the managed root. Implementations are
/// blocking; [`crate::SnapshotStore`] serializes mutations and moves calls
/// off the async runtime.
pub trait VersionControlBackend: Send + Sync {
    /// Create the repository and a baseline revision if none exists.
    ///
    /// Returns `true` when a repository was created, `false` when one was
    /// already present.
    fn initialize(&self) -> SnapshotResult<bool>;

    /// The revision HEAD points at.
    fn head(&self) -> SnapshotResult<Revision>;

    /// Look up a revision by full or abbreviated identifier.
    fn resolve(&self, id: &str) -> SnapshotResult<Revision>;

    /// Whether the working tree differs from HEAD (untracked files count).
    fn is_dirty(&self) -> SnapshotResult<bool>;

    /// Paths in the working tree that differ from `since`.
    fn changed_paths(&self, since: &RevisionId) -> SnapshotResult<Vec<PathBuf>>;

    /// Stage every change and commit. Fails with `NoChanges` on a clean tree.
    fn commit(&self, message: &str) -> SnapshotResult<Revision>;

    /// Up to `limit` revisions, newest first.
    fn log(&self, limit: usize) -> SnapshotResult<Vec<Revision>>;

    /// Unified diff text.
    ///
    /// - `(Some(a), Some(b))`: `a` to `b`
    /// - `(Some(a), None)`: `a` to the working tree
    /// - `(None, None)`: HEAD's predecessor to HEAD
    /// - `(None, Some(b))`: `b`'s predecessor to `b`
    fn diff(&self, from: Option<&RevisionId>, to: Option<&RevisionId>) -> SnapshotResult<String>;

    /// Discard working-tree changes and move HEAD so the tree matches `id`.
    fn hard_reset_to(&self, id: &RevisionId) -> SnapshotResult<()>;

    /// Copy files matching `patterns` from `id` into the working tree
    /// without moving HEAD. Returns the paths written.
    fn checkout_paths(&self, id: &RevisionId, patterns: &[String]) -> SnapshotResult<Vec<PathBuf>>;

    /// Delete every local branch except the checked-out one.
    fn delete_divergent_branches(&self) -> SnapshotResult<usize>;

    /// Drop history older than the `keep` newest revisions.
    fn delete_old_revisions(&self, keep: usize) -> SnapshotResult<PruneOutcome>;
}

/// What a history prune removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Revisions cut from the history.
    pub pruned_revisions: usize,
    /// Stored objects deleted from disk.
    pub removed_objects: usize,
}
