//! Configuration versioning for confvault.
//!
//! This crate keeps a live configuration directory under version control:
//! - Commit changes as immutable revisions
//! - Diff, roll back or selectively restore from any retained revision
//! - Group the writes of one logical operation into a single checkpoint
//! - Prune history down to a retention ceiling
//! - Reject paths that escape the managed root
//!
//! # Example
//!
//! ```no_run
//! use confvault_snapshot::{SnapshotConfig, SnapshotStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SnapshotStore::open("/config", SnapshotConfig::default())?);
//! store.ensure_initialized().await?;
//!
//! // Group several writes into one revision
//! let checkpoints = store.checkpoints();
//! checkpoints.begin("Install lighting package").await?;
//! for name in ["automations.yaml", "scripts.yaml"] {
//!     std::fs::write(store.guard().validate(name)?, "[]\n")?;
//!     store.commit_or_defer(&format!("Write {name}")).await?;
//! }
//! let revision = checkpoints.end().await?;
//!
//! // ... later, undo it
//! if let Some(revision) = revision {
//!     if let Some(parent) = revision.parent {
//!         store.rollback(parent.as_str()).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod checkpoint;
mod config;
mod error;
mod git;
mod guard;
mod retention;
mod revision;
mod store;

pub use backend::{PruneOutcome, VersionControlBackend};
pub use checkpoint::{Checkpoint, CheckpointManager};
pub use config::SnapshotConfig;
pub use error::{SnapshotError, SnapshotResult};
pub use git::{GitBackend, BASELINE_MESSAGE};
pub use guard::PathGuard;
pub use retention::{RetentionConfig, RetentionPolicy, RetentionReport};
pub use revision::{Revision, RevisionId};
pub use store::{SnapshotStore, SAFETY_MESSAGE};
