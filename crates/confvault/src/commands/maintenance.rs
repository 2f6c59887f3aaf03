//! Maintenance command handlers: init, cleanup and check-path.

use super::{open_store, print_json};
use crate::settings::Settings;
use anyhow::Context;
use confvault_snapshot::{PathGuard, SnapshotStore};
use serde_json::json;

/// Create the repository and baseline revision.
pub async fn handle_init(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let store = SnapshotStore::open(&settings.root, settings.snapshot.clone())
        .with_context(|| format!("Failed to open store at {}", settings.root.display()))?;
    let created = store
        .ensure_initialized()
        .await
        .context("Failed to initialize repository")?;

    if json {
        return print_json(&json!({
            "root": store.root(),
            "created": created,
            "enabled": settings.snapshot.enabled,
        }));
    }

    if !settings.snapshot.enabled {
        println!("Versioning is disabled; nothing initialized.");
    } else if created {
        println!("Initialized repository in {}", store.root().display());
    } else {
        println!("Repository already initialized in {}", store.root().display());
    }
    Ok(())
}

/// Prune history down to `max_revisions`.
pub async fn handle_cleanup(
    settings: &Settings,
    max_revisions: Option<usize>,
    prune_branches: bool,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let max_revisions = max_revisions.unwrap_or(settings.snapshot.max_revisions);
    let report = store
        .cleanup(max_revisions, prune_branches)
        .await
        .context("Cleanup failed")?;

    if json {
        return print_json(&json!({
            "pruned_count": report.pruned_revisions,
            "deleted_branches": report.deleted_branches,
            "removed_objects": report.removed_objects,
        }));
    }

    println!(
        "Pruned {} revision(s), {} branch(es), {} object(s); keeping the newest {max_revisions}.",
        report.pruned_revisions, report.deleted_branches, report.removed_objects
    );
    Ok(())
}

/// Check that a path stays inside the managed root.
pub fn handle_check_path(settings: &Settings, path: &str, json: bool) -> anyhow::Result<()> {
    let guard = PathGuard::new(&settings.root)
        .with_context(|| format!("Invalid root {}", settings.root.display()))?;
    let resolved = guard.validate(path)?;
    let relative = guard.relative(&resolved)?;

    if json {
        return print_json(&json!({ "path": resolved, "relative": relative }));
    }
    println!("{}", resolved.display());
    Ok(())
}
