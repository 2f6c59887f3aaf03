//! Revision command handlers: commit, history, diff, rollback, restore and
//! status.

use super::{open_store, print_json};
use crate::settings::Settings;
use anyhow::Context;
use confvault_snapshot::{Revision, RevisionId};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

#[derive(Serialize)]
struct HistoryEntry<'a> {
    id: &'a RevisionId,
    short_id: &'a str,
    message: &'a str,
    author: &'a str,
    timestamp: String,
    files_changed: usize,
}

impl<'a> From<&'a Revision> for HistoryEntry<'a> {
    fn from(revision: &'a Revision) -> Self {
        Self {
            id: &revision.id,
            short_id: revision.short_id(),
            message: &revision.message,
            author: &revision.author,
            timestamp: revision.timestamp.to_rfc3339(),
            files_changed: revision.files_changed,
        }
    }
}

/// Commit pending changes.
pub async fn handle_commit(settings: &Settings, message: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let revision = store.commit(message).await.context("Commit failed")?;

    if json {
        return print_json(&json!({
            "revision_id": revision.as_ref().map(|r| &r.id),
        }));
    }

    match revision {
        Some(revision) => println!("Committed {}: {}", revision.short_id(), revision.summary()),
        None => println!("No changes to commit."),
    }
    Ok(())
}

/// List revisions, newest first.
pub async fn handle_history(settings: &Settings, limit: usize, json: bool) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let revisions = store.history(limit).await.context("Failed to read history")?;

    if json {
        let entries: Vec<HistoryEntry<'_>> = revisions.iter().map(HistoryEntry::from).collect();
        return print_json(&json!({ "revisions": entries }));
    }

    if revisions.is_empty() {
        println!("No revisions found.");
        return Ok(());
    }

    println!("{:<10} {:<20} {:>5}  {}", "ID", "DATE", "FILES", "MESSAGE");
    println!("{}", "-".repeat(78));
    for revision in &revisions {
        println!(
            "{:<10} {:<20} {:>5}  {}",
            revision.short_id(),
            revision.timestamp.format("%Y-%m-%d %H:%M:%S"),
            revision.files_changed,
            revision.summary()
        );
    }
    Ok(())
}

/// Print a unified diff.
pub async fn handle_diff(
    settings: &Settings,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let diff = store.diff(from, to).await.context("Failed to compute diff")?;

    if json {
        return print_json(&json!({ "diff": diff }));
    }
    print!("{diff}");
    Ok(())
}

/// Reset the working tree to a revision.
pub async fn handle_rollback(
    settings: &Settings,
    revision: &str,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let safety = store
        .rollback(revision)
        .await
        .with_context(|| format!("Rollback to {revision} failed"))?;

    if json {
        return print_json(&json!({
            "target": revision,
            "safety_revision_id": &safety.id,
        }));
    }

    println!("Rolled back to {revision}.");
    println!("Undo with: confvault rollback {}", safety.short_id());
    Ok(())
}

/// Copy matching files out of a revision.
pub async fn handle_restore(
    settings: &Settings,
    revision: &str,
    patterns: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let restored = store
        .restore(revision, patterns)
        .await
        .with_context(|| format!("Restore from {revision} failed"))?;

    if json {
        return print_json(&json!({ "restored_paths": restored }));
    }

    if restored.is_empty() {
        println!("No files matched.");
    } else {
        println!("Restored {} file(s) from {revision}:", restored.len());
        for path in &restored {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

/// List paths with uncommitted changes.
pub async fn handle_status(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let changed: Vec<PathBuf> = store.status().await.context("Failed to read status")?;

    if json {
        return print_json(&json!({ "changed_paths": changed }));
    }

    if changed.is_empty() {
        println!("Working tree clean.");
    } else {
        println!("Uncommitted changes:");
        for path in &changed {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
