//! Logging initialization for the CLI.
//!
//! Logs go to stderr so stdout stays reserved for command output, including
//! `--json` documents.

use confvault_util::{LogConfig, LogLevel};
use std::io::IsTerminal;

/// Initialize logging based on verbosity.
///
/// Without `--verbose`, `CONFVAULT_LOG` may name a level; the default is
/// `warn`. `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        std::env::var("CONFVAULT_LOG")
            .ok()
            .and_then(|v| LogLevel::parse(&v))
            .unwrap_or(LogLevel::Warn)
    };

    confvault_util::log::init(LogConfig {
        print: true,
        level,
        include_location: verbose,
        ansi: std::io::stderr().is_terminal(),
    });
}
