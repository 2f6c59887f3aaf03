//! Revision data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content-addressed identifier of a revision (full hex object id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(pub String);

impl RevisionId {
    /// Create a revision ID from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form used in messages and listings.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<git2::Oid> for RevisionId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

/// An immutable snapshot of the managed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Unique identifier for this revision.
    pub id: RevisionId,

    /// Commit message.
    pub message: String,

    /// Name of the committer identity.
    pub author: String,

    /// When the revision was committed.
    pub timestamp: DateTime<Utc>,

    /// Retained predecessor, if any.
    #[serde(default)]
    pub parent: Option<RevisionId>,

    /// Number of files that differ from the predecessor.
    #[serde(default)]
    pub files_changed: usize,
}

impl Revision {
    /// Abbreviated identifier.
    pub fn short_id(&self) -> &str {
        self.id.short()
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        let id = RevisionId::from_string("0123456789abcdef0123456789abcdef01234567");
        assert_eq!(id.short(), "01234567");

        let tiny = RevisionId::from_string("abc");
        assert_eq!(tiny.short(), "abc");

        let wide = RevisionId::from_string("ééééééééé");
        assert_eq!(wide.short(), "éééééééé");
    }

    #[test]
    fn test_revision_serializes_id_as_string() {
        let revision = Revision {
            id: RevisionId::from_string("deadbeef"),
            message: "add A\n\nbody".to_string(),
            author: "confvault".to_string(),
            timestamp: Utc::now(),
            parent: None,
            files_changed: 1,
        };

        let json = serde_json::to_value(&revision).unwrap();
        assert_eq!(json["id"], "deadbeef");
        assert_eq!(revision.summary(), "add A");
    }
}
