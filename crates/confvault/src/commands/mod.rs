//! Command handlers for the confvault CLI.
//!
//! Each handler opens the store described by [`Settings`], runs one
//! operation and prints the result, either as text or as a JSON document
//! when `--json` is set.

pub mod batch;
pub mod logging;
pub mod maintenance;
pub mod revisions;

pub use batch::*;
pub use logging::*;
pub use maintenance::*;
pub use revisions::*;

use crate::settings::Settings;
use anyhow::Context;
use confvault_snapshot::SnapshotStore;
use serde::Serialize;
use std::sync::Arc;

/// Open the store at the configured root and make sure it is initialized.
pub async fn open_store(settings: &Settings) -> anyhow::Result<Arc<SnapshotStore>> {
    let store = SnapshotStore::open(&settings.root, settings.snapshot.clone())
        .with_context(|| format!("Failed to open store at {}", settings.root.display()))?;
    let store = Arc::new(store);
    store
        .ensure_initialized()
        .await
        .context("Failed to initialize repository")?;
    Ok(store)
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}
