//! Root containment checks for collaborator writes.

use crate::{SnapshotError, SnapshotResult};
use confvault_util::path::{is_within, relative_to, resolve};
use std::path::{Component, Path, PathBuf};

/// Name of the repository metadata directory inside the managed root.
pub(crate) const METADATA_DIR: &str = ".git";

/// Validates that paths stay inside the managed root.
///
/// Every collaborator must pass a path through [`PathGuard::validate`]
/// before writing to it.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for `root`. The root must exist.
    pub fn new(root: impl AsRef<Path>) -> SnapshotResult<Self> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| {
            SnapshotError::Initialization(format!("cannot resolve root {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    /// The canonical managed root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` and check that it is a descendant of the root.
    ///
    /// Relative paths are taken relative to the root. Symlinks are expanded
    /// component by component, dangling ones included, and `..` applies to
    /// the expanded prefix, so the check sees the location a write would
    /// actually touch.
    pub fn validate(&self, path: impl AsRef<Path>) -> SnapshotResult<PathBuf> {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let resolved = resolve(&joined)?;
        if !is_within(&resolved, &self.root) {
            return Err(SnapshotError::PathOutsideRoot {
                path: path.to_path_buf(),
                root: self.root.clone(),
            });
        }

        if resolved
            .strip_prefix(&self.root)
            .ok()
            .and_then(|rel| rel.components().next())
            .is_some_and(|first| first.as_os_str() == METADATA_DIR)
        {
            return Err(SnapshotError::ProtectedPath(path.to_path_buf()));
        }

        Ok(resolved)
    }

    /// Path of `path` relative to the root, after validation.
    pub fn relative(&self, path: impl AsRef<Path>) -> SnapshotResult<PathBuf> {
        let resolved = self.validate(path)?;
        Ok(relative_to(&resolved, &self.root).unwrap_or_default())
    }

    /// Check a restore pattern: it must be relative and must not climb out
    /// of the root or into repository metadata.
    pub fn validate_pattern(&self, pattern: &str) -> SnapshotResult<()> {
        let as_path = Path::new(pattern);
        let escapes = as_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(SnapshotError::PathOutsideRoot {
                path: as_path.to_path_buf(),
                root: self.root.clone(),
            });
        }

        if as_path
            .components()
            .find(|c| !matches!(c, Component::CurDir))
            .is_some_and(|first| first.as_os_str() == METADATA_DIR)
        {
            return Err(SnapshotError::ProtectedPath(as_path.to_path_buf()));
        }

        Ok(())
    }
}
