// ============================================================================
// vidshrink-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Core Error Types
//
// This module defines the error taxonomy for the work pipeline. Per-item
// failures (probe, encode, replace, per-path scan errors) are converted into
// log entries by the worker and pipeline; only a corrupt log, an inaccessible
// root and a failed log write ever escape a run as `Err`.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Error type for all fallible operations in vidshrink-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The root given to the run cannot be resolved or read.
    #[error("Invalid root path '{path}': {source}")]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compression log exists but cannot be parsed. Fatal at startup.
    #[error("Compression log '{path}' is corrupt and will not be trusted: {source}")]
    CorruptLog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The compression log could not be made durable.
    #[error("Failed to persist compression log '{path}': {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Codec probe failed: {0}")]
    ProbeFailure(String),

    #[error("Encode failed: {0}")]
    EncodeFailure(String),

    #[error("Failed to replace '{original}' with '{replacement}': {source}")]
    ReplaceFailure {
        original: PathBuf,
        replacement: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, io::Error),

    #[error("Failed waiting for command '{0}': {1}")]
    CommandWait(String, io::Error),

    #[error("Command '{cmd}' failed with status {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Required dependency '{0}' not found on PATH")]
    DependencyNotFound(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for vidshrink-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Builds a `CommandStart` error for a process that could not be spawned.
pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

/// Builds a `CommandWait` error for a process whose exit could not be collected.
pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Builds a `CommandFailed` error for a process that exited unsuccessfully.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}
