//! Snapshot store: commit, history, diff, rollback and restore over a
//! version-controlled configuration directory.

use crate::backend::VersionControlBackend;
use crate::checkpoint::{Checkpoint, CheckpointManager};
use crate::git::GitBackend;
use crate::guard::PathGuard;
use crate::retention::{RetentionConfig, RetentionPolicy, RetentionReport};
use crate::{Revision, SnapshotConfig, SnapshotError, SnapshotResult};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info, warn};

/// Message prefix of the revision taken right before a rollback.
pub const SAFETY_MESSAGE: &str = "pre-rollback safety snapshot";

/// State guarded by the store's process-wide lock.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    /// The open checkpoint, if any.
    pub(crate) checkpoint: Option<Checkpoint>,
    /// Active retention policy.
    pub(crate) retention: RetentionPolicy,
}

pub(crate) type WriteState = OwnedRwLockWriteGuard<StoreState>;
pub(crate) type ReadState = OwnedRwLockReadGuard<StoreState>;

/// Versioned store wrapping a live configuration directory.
///
/// Every mutation holds the write side of a single lock for its whole
/// duration; `history`, `diff` and `status` share the read side. tokio's
/// lock is fair, so mutations apply in arrival order.
///
/// The guard travels into the blocking task that does the backend work and
/// is released only when that work has finished. Dropping a pending call
/// (a timeout, a cancelled request) therefore never lets the next mutation
/// start while git is still busy.
///
/// ```no_run
/// use confvault_snapshot::{SnapshotConfig, SnapshotStore};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(SnapshotStore::open("/config", SnapshotConfig::default())?);
/// store.ensure_initialized().await?;
///
/// store
///     .write_file("automations.yaml", "[]\n", "Update automations")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SnapshotStore {
    pub(crate) backend: Arc<dyn VersionControlBackend>,
    guard: PathGuard,
    pub(crate) config: SnapshotConfig,
    state: Arc<RwLock<StoreState>>,
}

impl SnapshotStore {
    /// Open a git-backed store rooted at `root`.
    ///
    /// Nothing is written until [`SnapshotStore::ensure_initialized`].
    pub fn open(root: impl AsRef<Path>, config: SnapshotConfig) -> SnapshotResult<Self> {
        let guard = PathGuard::new(root)?;
        let backend = GitBackend::new(
            guard.root(),
            config.author_name.clone(),
            config.author_email.clone(),
        );
        Self::with_backend(Arc::new(backend), guard, config)
    }

    /// Build a store over any backend.
    pub fn with_backend(
        backend: Arc<dyn VersionControlBackend>,
        guard: PathGuard,
        config: SnapshotConfig,
    ) -> SnapshotResult<Self> {
        let retention = RetentionPolicy::new(config.retention()?);
        if !config.enabled {
            debug!("Configuration versioning is disabled");
        }

        Ok(Self {
            backend,
            guard,
            config,
            state: Arc::new(RwLock::new(StoreState {
                checkpoint: None,
                retention,
            })),
        })
    }

    /// Path validation for collaborators writing into the root.
    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// The managed root.
    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// A checkpoint manager bound to this store.
    pub fn checkpoints(self: &Arc<Self>) -> CheckpointManager {
        CheckpointManager::new(self)
    }

    /// Create the repository and a baseline revision if missing.
    ///
    /// Safe to call on every start. Returns `true` when a repository was
    /// created.
    pub async fn ensure_initialized(&self) -> SnapshotResult<bool> {
        if !self.config.enabled {
            return Ok(false);
        }

        let state = self.lock_write().await;
        let (_, created) = self.run(state, |backend, _| backend.initialize()).await?;
        if created {
            info!(root = %self.root().display(), "Snapshot repository initialized");
        } else {
            debug!(root = %self.root().display(), "Snapshot repository loaded");
        }
        Ok(created)
    }

    /// Commit pending changes, or defer while a checkpoint is open.
    ///
    /// Returns `None` when nothing changed, when the commit was deferred, or
    /// when versioning is disabled.
    pub async fn commit_or_defer(&self, message: &str) -> SnapshotResult<Option<Revision>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let state = self.lock_write().await;
        self.commit_or_defer_locked(state, message).await
    }

    /// Explicit commit requested by a collaborator. Same rules as
    /// [`SnapshotStore::commit_or_defer`].
    pub async fn commit(&self, message: &str) -> SnapshotResult<Option<Revision>> {
        self.commit_or_defer(message).await
    }

    /// Write `contents` to `path` inside the root, then commit or defer.
    ///
    /// The write and its commit happen under one hold of the write lock, so
    /// concurrent callers each get their own revision and no revision picks
    /// up another caller's file.
    pub async fn write_file(
        &self,
        path: impl AsRef<Path>,
        contents: impl Into<Vec<u8>>,
        message: &str,
    ) -> SnapshotResult<Option<Revision>> {
        let target = self.guard.validate(path)?;
        let contents = contents.into();

        let state = self.lock_write().await;
        let (state, ()) = self
            .run(state, move |_, _| {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, contents)?;
                Ok(())
            })
            .await?;

        if !self.config.enabled {
            return Ok(None);
        }
        self.commit_or_defer_locked(state, message).await
    }

    /// Up to `limit` revisions, newest first.
    pub async fn history(&self, limit: usize) -> SnapshotResult<Vec<Revision>> {
        if !self.config.enabled {
            return Ok(Vec::new());
        }

        let state = self.lock_read().await;
        let (_, revisions) = self.run(state, move |backend, _| backend.log(limit)).await?;
        Ok(revisions)
    }

    /// Unified diff; see [`VersionControlBackend::diff`] for the meaning of
    /// omitted revisions.
    pub async fn diff(&self, from: Option<&str>, to: Option<&str>) -> SnapshotResult<String> {
        self.ensure_enabled()?;

        let from = from.map(str::to_string);
        let to = to.map(str::to_string);
        let state = self.lock_read().await;
        let (_, patch) = self
            .run(state, move |backend, _| {
                let from = from.map(|id| backend.resolve(&id)).transpose()?;
                let to = to.map(|id| backend.resolve(&id)).transpose()?;
                backend.diff(from.as_ref().map(|r| &r.id), to.as_ref().map(|r| &r.id))
            })
            .await?;
        Ok(patch)
    }

    /// Paths that differ from HEAD.
    pub async fn status(&self) -> SnapshotResult<Vec<PathBuf>> {
        self.ensure_enabled()?;

        let state = self.lock_read().await;
        let (_, paths) = self
            .run(state, |backend, _| {
                let head = backend.head()?;
                backend.changed_paths(&head.id)
            })
            .await?;
        Ok(paths)
    }

    /// Reset the working tree to `revision_id`.
    ///
    /// Uncommitted work is first captured in a safety revision, which is
    /// returned; rolling back to it undoes the rollback. When the tree was
    /// already clean, HEAD plays that role and is returned instead.
    pub async fn rollback(&self, revision_id: &str) -> SnapshotResult<Revision> {
        self.ensure_enabled()?;

        let id = revision_id.to_string();
        let state = self.lock_write().await;
        let (_, (target, safety)) = self
            .run(state, move |backend, _| {
                let target = backend.resolve(&id)?;
                let safety = if backend.is_dirty()? {
                    let message = format!("{SAFETY_MESSAGE} (rolling back to {})", target.short_id());
                    match backend.commit(&message) {
                        Ok(revision) => revision,
                        Err(SnapshotError::NoChanges) => backend.head()?,
                        Err(e) => return Err(e),
                    }
                } else {
                    backend.head()?
                };
                backend.hard_reset_to(&target.id)?;
                Ok((target, safety))
            })
            .await?;

        warn!(
            target = %target.short_id(),
            safety = %safety.short_id(),
            "Rolled back configuration"
        );
        Ok(safety)
    }

    /// Copy files matching `patterns` from `revision_id` into the working
    /// tree and commit them. HEAD keeps its position.
    ///
    /// While a checkpoint is open the commit is deferred like any other
    /// write.
    pub async fn restore(
        &self,
        revision_id: &str,
        patterns: &[String],
    ) -> SnapshotResult<Vec<PathBuf>> {
        self.ensure_enabled()?;
        if patterns.is_empty() {
            return Err(SnapshotError::operation_failed("No file patterns to restore"));
        }
        for pattern in patterns {
            self.guard.validate_pattern(pattern)?;
        }

        let state = self.lock_write().await;
        let id = revision_id.to_string();
        let owned = patterns.to_vec();
        let (state, (source, touched, deferred)) = self
            .run(state, move |backend, state: &mut WriteState| {
                let source = backend.resolve(&id)?;
                let touched = backend.checkout_paths(&source.id, &owned)?;
                let deferred = match state.checkpoint.as_mut() {
                    Some(checkpoint) if !touched.is_empty() => {
                        checkpoint.deferred_commits += 1;
                        true
                    }
                    _ => false,
                };
                Ok((source, touched, deferred))
            })
            .await?;

        if touched.is_empty() {
            debug!(source = %source.short_id(), ?patterns, "Restore matched no files");
            return Ok(touched);
        }

        info!(
            source = %source.short_id(),
            files = touched.len(),
            "Restored files from revision"
        );
        if deferred {
            return Ok(touched);
        }

        let message = format!("Restore {} from {}", patterns.join(", "), source.short_id());
        let (state, revision) = self.commit_now(state, message).await?;
        if revision.is_some() {
            self.auto_cleanup(state).await;
        }
        Ok(touched)
    }

    /// Prune history to the newest `max_revisions` revisions.
    ///
    /// Irreversible. With `prune_branches`, local branches other than the
    /// current one are deleted first.
    pub async fn cleanup(
        &self,
        max_revisions: usize,
        prune_branches: bool,
    ) -> SnapshotResult<RetentionReport> {
        self.ensure_enabled()?;
        let policy = RetentionPolicy::new(RetentionConfig::new(max_revisions)?);

        let state = self.lock_write().await;
        let (_, report) = self
            .run(state, move |backend, _| policy.apply(backend, prune_branches))
            .await?;

        info!(
            max_revisions,
            pruned = report.pruned_revisions,
            branches = report.deleted_branches,
            objects = report.removed_objects,
            "History cleanup finished"
        );
        Ok(report)
    }

    /// Replace the retention ceiling used by automatic cleanup.
    pub async fn reconfigure_retention(&self, config: RetentionConfig) {
        let mut state = self.lock_write().await;
        state.retention = RetentionPolicy::new(config);
        debug!(max_revisions = config.max_revisions(), "Retention reconfigured");
    }

    /// The retention ceiling currently in force.
    pub async fn retention(&self) -> RetentionConfig {
        self.lock_read().await.retention.config()
    }

    pub(crate) fn ensure_enabled(&self) -> SnapshotResult<()> {
        if self.config.enabled {
            Ok(())
        } else {
            Err(SnapshotError::Disabled)
        }
    }

    pub(crate) async fn lock_write(&self) -> WriteState {
        Arc::clone(&self.state).write_owned().await
    }

    pub(crate) async fn lock_read(&self) -> ReadState {
        Arc::clone(&self.state).read_owned().await
    }

    async fn commit_or_defer_locked(
        &self,
        mut state: WriteState,
        message: &str,
    ) -> SnapshotResult<Option<Revision>> {
        if let Some(checkpoint) = state.checkpoint.as_mut() {
            checkpoint.deferred_commits += 1;
            debug!(
                checkpoint = %checkpoint.description,
                deferred = checkpoint.deferred_commits,
                pending = message,
                "Deferring commit until checkpoint ends"
            );
            return Ok(None);
        }

        let message = effective_message(message);
        let (state, revision) = self.commit_now(state, message).await?;
        if revision.is_some() {
            self.auto_cleanup(state).await;
        }
        Ok(revision)
    }

    /// Commit on the backend; "no changes" becomes `None`.
    pub(crate) async fn commit_now(
        &self,
        state: WriteState,
        message: String,
    ) -> SnapshotResult<(WriteState, Option<Revision>)> {
        let (state, revision) = self
            .run(state, move |backend, _| match backend.commit(&message) {
                Ok(revision) => Ok(Some(revision)),
                Err(SnapshotError::NoChanges) => Ok(None),
                Err(e) => Err(e),
            })
            .await?;

        match &revision {
            Some(revision) => info!(
                revision = %revision.short_id(),
                files = revision.files_changed,
                "Committed changes: {}",
                revision.summary()
            ),
            None => debug!("No changes to commit"),
        }
        Ok((state, revision))
    }

    /// Prune after a commit when configured to. Failures are logged, never
    /// propagated: the commit already landed.
    pub(crate) async fn auto_cleanup(&self, state: WriteState) {
        if !self.config.auto_cleanup {
            return;
        }

        let policy = state.retention.clone();
        match self.run(state, move |backend, _| policy.apply(backend, false)).await {
            Ok((_, report)) if report.pruned_revisions > 0 => {
                info!(pruned = report.pruned_revisions, "Automatic cleanup pruned history");
            }
            Ok(_) => {}
            Err(e) => warn!("Automatic cleanup failed: {}", e),
        }
    }

    /// Run a blocking backend operation off the async runtime.
    ///
    /// `lock` moves into the blocking task and is handed back with the
    /// result; it is released only once `op` has returned, even when the
    /// awaiting future is dropped first. `op` may update the guarded state
    /// so that bookkeeping lands together with the backend work.
    pub(crate) async fn run<L, T, F>(&self, lock: L, op: F) -> SnapshotResult<(L, T)>
    where
        L: Send + 'static,
        F: FnOnce(&dyn VersionControlBackend, &mut L) -> SnapshotResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || {
            let mut lock = lock;
            op(backend.as_ref(), &mut lock).map(|value| (lock, value))
        })
        .await
        .map_err(|e| SnapshotError::operation_failed(format!("backend task failed: {e}")))?
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("root", &self.root())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn effective_message(message: &str) -> String {
    if message.trim().is_empty() {
        format!("Auto-commit at {}", Utc::now().to_rfc3339())
    } else {
        message.to_string()
    }
}
