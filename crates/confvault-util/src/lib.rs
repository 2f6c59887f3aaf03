//! Shared utilities for confvault.
//!
//! This crate provides common utilities used across the confvault workspace:
//! - Logging setup with tracing
//! - Path utilities for root containment checks

pub mod log;
pub mod path;

pub use log::{LogConfig, LogLevel};
