//! Configuration for the snapshot store.

use crate::retention::RetentionConfig;
use crate::SnapshotResult;
use serde::{Deserialize, Serialize};

/// Configuration for snapshot storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Whether versioning is enabled.
    pub enabled: bool,

    /// Number of revisions retention keeps.
    pub max_revisions: usize,

    /// Whether to prune down to `max_revisions` after every commit.
    pub auto_cleanup: bool,

    /// Committer name recorded on revisions.
    pub author_name: String,

    /// Committer email recorded on revisions.
    pub author_email: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_revisions: 50,
            auto_cleanup: false,
            author_name: "confvault".to_string(),
            author_email: "confvault@localhost".to_string(),
        }
    }
}

impl SnapshotConfig {
    /// Validated retention ceiling.
    pub fn retention(&self) -> SnapshotResult<RetentionConfig> {
        RetentionConfig::new(self.max_revisions)
    }
}
