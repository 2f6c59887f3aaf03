//! Checkpoints coalesce the writes of one logical operation into a single
//! revision.
//!
//! A [`CheckpointManager`] is a handle onto the checkpoint slot of one
//! [`SnapshotStore`]; the state lives under the store's lock, so `begin`,
//! `commit_or_defer` and `end` from different callers are serialized with
//! every other mutation. At most one checkpoint is open per store.
//!
//! Checkpoints are not persisted. After a restart the store starts idle and
//! uncommitted changes left by an unfinished checkpoint are picked up by the
//! next ordinary commit.

use crate::store::WriteState;
use crate::{Revision, SnapshotError, SnapshotResult, SnapshotStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// An open checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// What the grouped operation does; becomes the commit message.
    pub description: String,

    /// HEAD when the checkpoint was opened.
    pub start_revision: Revision,

    /// When the checkpoint was opened.
    pub opened_at: DateTime<Utc>,

    /// Commits requested (and deferred) since opening.
    pub deferred_commits: usize,
}

impl Checkpoint {
    fn new(description: &str, start_revision: Revision) -> Self {
        let description = match description.trim() {
            "" => "Checkpoint".to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            description,
            start_revision,
            opened_at: Utc::now(),
            deferred_commits: 0,
        }
    }

    /// Commit message used when the checkpoint ends.
    fn commit_message(&self, changed_files: usize) -> String {
        let noun = if changed_files == 1 { "file" } else { "files" };
        format!("{} ({changed_files} {noun} changed)", self.description)
    }
}

/// Opens and closes checkpoints on a [`SnapshotStore`].
///
/// Holds a weak reference: the store owns the lifecycle, and calls on a
/// manager whose store was dropped fail with [`SnapshotError::StoreClosed`].
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    store: Weak<SnapshotStore>,
}

impl CheckpointManager {
    pub fn new(store: &Arc<SnapshotStore>) -> Self {
        Self {
            store: Arc::downgrade(store),
        }
    }

    fn store(&self) -> SnapshotResult<Arc<SnapshotStore>> {
        self.store.upgrade().ok_or(SnapshotError::StoreClosed)
    }

    /// Open a checkpoint, or join the one already open.
    ///
    /// Joining returns the existing checkpoint unchanged, so a retried
    /// caller never nests checkpoints.
    pub async fn begin(&self, description: &str) -> SnapshotResult<Checkpoint> {
        let store = self.store()?;
        store.ensure_enabled()?;

        let state = store.lock_write().await;
        if let Some(existing) = &state.checkpoint {
            debug!(
                checkpoint = %existing.description,
                requested = description,
                "Joining open checkpoint"
            );
            return Ok(existing.clone());
        }

        let description = description.to_string();
        let (_, checkpoint) = store
            .run(state, move |backend, state: &mut WriteState| {
                let checkpoint = Checkpoint::new(&description, backend.head()?);
                state.checkpoint = Some(checkpoint.clone());
                Ok(checkpoint)
            })
            .await?;
        info!(
            checkpoint = %checkpoint.description,
            start = %checkpoint.start_revision.short_id(),
            "Checkpoint opened"
        );

        Ok(checkpoint)
    }

    /// Close the checkpoint and commit everything written since it opened.
    ///
    /// Returns `None` when nothing changed. If the commit fails the
    /// checkpoint stays open so the caller can retry or abort.
    pub async fn end(&self) -> SnapshotResult<Option<Revision>> {
        let store = self.store()?;

        let state = store.lock_write().await;
        let checkpoint = state
            .checkpoint
            .clone()
            .ok_or(SnapshotError::CheckpointNotActive)?;

        let pending = checkpoint.clone();
        let (state, outcome) = store
            .run(state, move |backend, state: &mut WriteState| {
                let changed = backend.changed_paths(&pending.start_revision.id)?.len();
                let outcome = match backend.commit(&pending.commit_message(changed)) {
                    Ok(revision) => Some(revision),
                    Err(SnapshotError::NoChanges) => None,
                    Err(e) => return Err(e),
                };
                state.checkpoint = None;
                Ok(outcome)
            })
            .await?;

        match &outcome {
            Some(revision) => {
                info!(
                    checkpoint = %checkpoint.description,
                    revision = %revision.short_id(),
                    writes = checkpoint.deferred_commits,
                    "Checkpoint committed"
                );
                store.auto_cleanup(state).await;
            }
            None => debug!(checkpoint = %checkpoint.description, "Checkpoint ended without changes"),
        }

        Ok(outcome)
    }

    /// Close the checkpoint without committing.
    ///
    /// Changes already written stay on disk, uncommitted. Aborting when no
    /// checkpoint is open does nothing.
    pub async fn abort(&self) -> SnapshotResult<Option<Checkpoint>> {
        let store = self.store()?;

        let mut state = store.lock_write().await;
        let aborted = state.checkpoint.take();
        if let Some(checkpoint) = &aborted {
            warn!(
                checkpoint = %checkpoint.description,
                writes = checkpoint.deferred_commits,
                "Checkpoint aborted; changes left uncommitted"
            );
        }

        Ok(aborted)
    }

    /// The open checkpoint, if any.
    pub async fn current(&self) -> SnapshotResult<Option<Checkpoint>> {
        let store = self.store()?;
        let state = store.lock_read().await;
        Ok(state.checkpoint.clone())
    }

    pub async fn is_active(&self) -> SnapshotResult<bool> {
        Ok(self.current().await?.is_some())
    }
}
