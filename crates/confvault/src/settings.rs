//! Layered settings for the confvault binary.
//!
//! Settings are loaded in order, later layers overriding earlier ones:
//! 1. Built-in defaults
//! 2. Global config file: `~/.config/confvault/config.json`
//! 3. Environment variable: `CONFVAULT_CONFIG_CONTENT` (JSON)
//! 4. Environment overrides: `CONFVAULT_ROOT`, `CONFVAULT_ENABLED`,
//!    `CONFVAULT_MAX_REVISIONS`, `CONFVAULT_AUTO_CLEANUP`
//! 5. Command-line flags

use anyhow::{bail, Context};
use confvault_snapshot::SnapshotConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

/// One settings layer as written in a config file. Unset fields leave the
/// previous layer alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub root: Option<PathBuf>,
    pub enabled: Option<bool>,
    pub max_revisions: Option<usize>,
    pub auto_cleanup: Option<bool>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

impl SettingsFile {
    /// Merge another layer into this one; `other` wins.
    pub fn merge(mut self, other: Self) -> Self {
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.max_revisions.is_some() {
            self.max_revisions = other.max_revisions;
        }
        if other.auto_cleanup.is_some() {
            self.auto_cleanup = other.auto_cleanup;
        }
        if other.author_name.is_some() {
            self.author_name = other.author_name;
        }
        if other.author_email.is_some() {
            self.author_email = other.author_email;
        }
        self
    }

    fn parse(content: &str, source: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).with_context(|| format!("Invalid settings in {source}"))
    }

    fn from_env(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            root: var("CONFVAULT_ROOT").map(PathBuf::from),
            enabled: var("CONFVAULT_ENABLED")
                .map(|v| parse_bool("CONFVAULT_ENABLED", &v))
                .transpose()?,
            max_revisions: var("CONFVAULT_MAX_REVISIONS")
                .map(|v| {
                    v.trim()
                        .parse()
                        .with_context(|| format!("CONFVAULT_MAX_REVISIONS is not a number: {v}"))
                })
                .transpose()?,
            auto_cleanup: var("CONFVAULT_AUTO_CLEANUP")
                .map(|v| parse_bool("CONFVAULT_AUTO_CLEANUP", &v))
                .transpose()?,
            ..Default::default()
        })
    }
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The managed configuration directory.
    pub root: PathBuf,
    pub snapshot: SnapshotConfig,
    /// Files that contributed to these settings.
    pub sources: Vec<PathBuf>,
}

impl Settings {
    /// Load settings from the standard locations and the process
    /// environment. `cli_root` wins over every other source.
    pub fn load(cli_root: Option<&Path>) -> anyhow::Result<Self> {
        let global = confvault_util::path::config_dir().map(|dir| dir.join(CONFIG_FILE));
        Self::load_from(global.as_deref(), |name| std::env::var(name).ok(), cli_root)
    }

    /// Load settings with an explicit global file and environment lookup.
    pub fn load_from(
        global_file: Option<&Path>,
        var: impl Fn(&str) -> Option<String>,
        cli_root: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let mut layer = SettingsFile::default();
        let mut sources = Vec::new();

        if let Some(path) = global_file.filter(|p| p.exists()) {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            layer = layer.merge(SettingsFile::parse(&content, &path.display().to_string())?);
            sources.push(path.to_path_buf());
        }

        if let Some(content) = var("CONFVAULT_CONFIG_CONTENT") {
            layer = layer.merge(SettingsFile::parse(&content, "<env>")?);
        }

        layer = layer.merge(SettingsFile::from_env(&var)?);

        if let Some(root) = cli_root {
            layer.root = Some(root.to_path_buf());
        }

        let root = match layer.root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let defaults = SnapshotConfig::default();
        let snapshot = SnapshotConfig {
            enabled: layer.enabled.unwrap_or(defaults.enabled),
            max_revisions: layer.max_revisions.unwrap_or(defaults.max_revisions),
            auto_cleanup: layer.auto_cleanup.unwrap_or(defaults.auto_cleanup),
            author_name: layer.author_name.unwrap_or(defaults.author_name),
            author_email: layer.author_email.unwrap_or(defaults.author_email),
        };

        Ok(Self {
            root,
            snapshot,
            sources,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{name} must be true or false, got {other:?}"),
    }
}
