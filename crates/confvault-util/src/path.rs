//! Path utilities.
//!
//! This module provides utilities for working with file paths.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Get the confvault configuration directory.
///
/// This follows XDG conventions on Linux/macOS:
/// - `$XDG_CONFIG_HOME/confvault` if set
/// - `~/.config/confvault` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("confvault"))
}

/// Check if a path is within a base directory.
///
/// Both paths are compared component-wise; callers resolve them first.
pub fn is_within(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Symlink hops allowed while resolving one path, matching Linux `ELOOP`.
const MAX_SYMLINK_HOPS: usize = 40;

/// Resolve `path` the way the kernel would when opening it for writing.
///
/// Components are walked left to right. Every symlink is read with
/// `read_link` and expanded in place, including links whose target does not
/// exist, and `..` is applied only to the already-resolved prefix. Missing
/// components are appended unchanged, so the result names the location a
/// write to `path` would actually touch. `path` should be absolute.
pub fn resolve(path: &Path) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    let mut pending: VecDeque<PathBuf> = components_of(path);
    let mut hops = 0;

    while let Some(component) = pending.pop_front() {
        match component.components().next() {
            Some(Component::Prefix(_)) | Some(Component::RootDir) => {
                resolved.push(&component);
            }
            Some(Component::CurDir) | None => {}
            Some(Component::ParentDir) => {
                resolved.pop();
            }
            Some(Component::Normal(name)) => {
                let candidate = resolved.join(name);
                match fs::symlink_metadata(&candidate) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        hops += 1;
                        if hops > MAX_SYMLINK_HOPS {
                            return Err(io::Error::other(format!(
                                "too many levels of symbolic links: {}",
                                path.display()
                            )));
                        }
                        let target = fs::read_link(&candidate)?;
                        for part in components_of(&target).into_iter().rev() {
                            pending.push_front(part);
                        }
                    }
                    Ok(_) => resolved = candidate,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => resolved = candidate,
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Ok(resolved)
}

fn components_of(path: &Path) -> VecDeque<PathBuf> {
    path.components()
        .map(|c| PathBuf::from(c.as_os_str()))
        .collect()
}

/// Make a path relative to a base directory.
///
/// Returns `None` if the path is not within the base directory.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}
