// vidshrink-cli/src/lib.rs
//
// Library portion of the vidshrink CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, CompressArgs};
pub use commands::compress::{CompressStatus, run_compress};
