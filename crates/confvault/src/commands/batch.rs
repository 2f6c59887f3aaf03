//! Run an external command inside a checkpoint.

use super::{open_store, print_json};
use crate::settings::Settings;
use anyhow::{bail, Context};
use serde_json::json;
use tokio::process::Command;
use tracing::{info, warn};

/// Run `command` with the root as working directory. Everything it writes
/// becomes one revision; if it fails, the checkpoint is aborted and its
/// changes are left uncommitted.
pub async fn handle_batch(
    settings: &Settings,
    description: &str,
    command: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let Some((program, args)) = command.split_first() else {
        bail!("No command given");
    };

    let store = open_store(settings).await?;
    let checkpoints = store.checkpoints();
    checkpoints
        .begin(description)
        .await
        .context("Failed to open checkpoint")?;

    let status = Command::new(program)
        .args(args)
        .current_dir(store.root())
        .env("CONFVAULT_ROOT", store.root())
        .status()
        .await;

    let status = match status {
        Ok(status) if status.success() => status,
        Ok(status) => {
            checkpoints.abort().await?;
            warn!(%status, "Batch command failed; checkpoint aborted");
            bail!("Command `{program}` failed with {status}; changes left uncommitted");
        }
        Err(e) => {
            checkpoints.abort().await?;
            return Err(e).with_context(|| format!("Failed to run `{program}`"));
        }
    };

    let revision = checkpoints.end().await.context("Failed to commit checkpoint")?;
    info!(%status, committed = revision.is_some(), "Batch finished");

    if json {
        return print_json(&json!({
            "revision_id": revision.as_ref().map(|r| &r.id),
        }));
    }

    match revision {
        Some(revision) => println!("Committed {}: {}", revision.short_id(), revision.message),
        None => println!("No changes to commit."),
    }
    Ok(())
}
