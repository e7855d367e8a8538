//! Partial-output file management.
//!
//! The encoder always writes next to the original (same directory, so the
//! final rename never crosses a filesystem) under a deterministic name. A
//! deterministic name lets a restarted run find and discard whatever a killed
//! run left behind.

use crate::error::CoreResult;

use std::io;
use std::path::{Path, PathBuf};

/// Marker inserted between the file stem and its extension.
pub const PARTIAL_MARKER: &str = ".vidshrink-partial";

/// Returns the path the encoder writes to for `original`.
///
/// `movie.mp4` becomes `movie.vidshrink-partial.mp4`; the extension is kept so
/// ffmpeg picks the same container as the original.
#[must_use]
pub fn partial_output_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let filename = match original.extension() {
        Some(ext) => format!("{stem}{PARTIAL_MARKER}.{}", ext.to_string_lossy()),
        None => format!("{stem}{PARTIAL_MARKER}"),
    };
    original.with_file_name(filename)
}

/// Returns true if `path` names a partial output produced by this tool.
#[must_use]
pub fn is_partial_output(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.ends_with(PARTIAL_MARKER));
    let stem_matches = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(PARTIAL_MARKER));
    name_matches || stem_matches
}

/// Deletes a partial output if present. Returns true if a file was removed.
pub fn discard_partial(path: &Path) -> CoreResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed partial output {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
