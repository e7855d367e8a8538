// vidshrink-cli/src/config.rs
//
// Defaults for the `vidshrink` binary. Encoder defaults live in
// vidshrink-core's `CoreConfig`.

/// Log filter used when neither RUST_LOG nor -v/-q is given.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Exit code for a fatal error.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for a run stopped by Ctrl+C (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Redraw interval of the progress bar.
pub const PROGRESS_TICK_MS: u64 = 200;
