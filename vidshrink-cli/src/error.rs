// ============================================================================
// vidshrink-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reuses vidshrink-core's error type; a run that fails with one of
// them is reported as a single red `Error:` line on stderr.
//
// AI-ASSISTANT-INFO: CLI error handling utilities

// ---- Internal crate imports ----
use vidshrink_core::{CoreError, CoreResult};

// ---- External crate imports ----
use owo_colors::OwoColorize;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Formats a fatal error for stderr, coloured when `color` is set.
pub fn format_fatal(err: &CoreError, color: bool) -> String {
    let line = format!("Error: {err}");
    if color {
        line.red().bold().to_string()
    } else {
        line
    }
}
