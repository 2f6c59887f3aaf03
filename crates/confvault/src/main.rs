//! confvault - versioned configuration directories.
//!
//! This is the main entry point for the confvault CLI.

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use commands::*;
use settings::Settings;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "confvault")]
#[command(author, version, about = "Versioning, checkpoints and rollback for configuration directories", long_about = None)]
struct Cli {
    /// Managed configuration directory (defaults to CONFVAULT_ROOT or the
    /// current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the repository and a baseline revision
    Init,
    /// Commit pending changes
    Commit {
        /// Commit message (generated when empty)
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// List revisions, newest first
    History {
        /// Maximum number of revisions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show a unified diff
    ///
    /// With no revisions, shows the last commit. With one, compares it to
    /// the working tree. With two, compares them.
    Diff {
        /// Older revision
        from: Option<String>,
        /// Newer revision
        to: Option<String>,
    },
    /// Reset the working tree to a revision (a safety revision is taken first)
    Rollback {
        /// Revision to roll back to
        revision: String,
    },
    /// Copy files matching patterns out of a revision
    Restore {
        /// Revision to copy from
        revision: String,
        /// Paths or glob patterns relative to the root
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// List paths with uncommitted changes
    Status,
    /// Prune history to the newest revisions (irreversible)
    Cleanup {
        /// Revisions to keep (defaults to the configured ceiling)
        #[arg(short, long)]
        max: Option<usize>,
        /// Also delete local branches other than the current one
        #[arg(long)]
        prune_branches: bool,
    },
    /// Check that a path stays inside the root
    CheckPath {
        /// Path to check
        path: String,
    },
    /// Run a command and commit everything it writes as one revision
    Batch {
        /// Description used as the commit message
        #[arg(short, long)]
        description: String,
        /// Command and arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let settings = Settings::load(cli.root.as_deref())?;
    debug!(
        root = %settings.root.display(),
        sources = ?settings.sources,
        "Settings loaded"
    );

    let json = cli.json;
    match cli.command {
        Commands::Init => handle_init(&settings, json).await,
        Commands::Commit { message } => handle_commit(&settings, &message, json).await,
        Commands::History { limit } => handle_history(&settings, limit, json).await,
        Commands::Diff { from, to } => {
            handle_diff(&settings, from.as_deref(), to.as_deref(), json).await
        }
        Commands::Rollback { revision } => handle_rollback(&settings, &revision, json).await,
        Commands::Restore { revision, patterns } => {
            handle_restore(&settings, &revision, &patterns, json).await
        }
        Commands::Status => handle_status(&settings, json).await,
        Commands::Cleanup {
            max,
            prune_branches,
        } => handle_cleanup(&settings, max, prune_branches, json).await,
        Commands::CheckPath { path } => handle_check_path(&settings, &path, json),
        Commands::Batch {
            description,
            command,
        } => handle_batch(&settings, &description, &command, json).await,
    }
}
