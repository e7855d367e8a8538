//! Command implementations for the CLI.

/// Module containing the implementation of the compression run.
pub mod compress;
