// ============================================================================
// vidshrink-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with External CLI Tools and File System
//
// This module encapsulates the collaborators the pipeline depends on but does
// not implement: the ffmpeg encoder, the ffprobe codec prober, and the two
// file-system operations the worker's crash-safety rests on (measuring sizes
// and atomically replacing the original).
//
// KEY COMPONENTS:
// - Encoder / CodecProber: capability traits consumed by the worker
// - FfmpegSpawner / FfmpegProcess: process seam below the ffmpeg encoder
// - FileMetadataProvider / FileReplacer: file-system seams for fault injection
// - check_dependency: startup check for ffmpeg and ffprobe
//
// AI-ASSISTANT-INFO: External tool interactions and abstractions for ffmpeg/ffprobe

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains ffmpeg argument building logic and the ffmpeg-backed encoder
pub mod ffmpeg;

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Contains traits and implementations for probing codecs with ffprobe
pub mod ffprobe_executor;

#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg::{EncodeParams, EncodeProgress, Encoder, FfmpegEncoder, build_ffmpeg_command};
pub use ffmpeg_executor::{
    ChildTracker, FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner,
};
pub use ffprobe_executor::{CodecProber, FfprobeProber, ProbeResult};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `<cmd_name> -version` with output discarded.
///
/// # Errors
///
/// * `CoreError::DependencyNotFound` - the command is not on `PATH`
/// * `CoreError::CommandStart` - the command exists but failed to start
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

// ============================================================================
// FILE SYSTEM SEAMS
// ============================================================================

/// Trait for abstracting file metadata access operations.
///
/// # Examples
///
/// ```rust
/// use vidshrink_core::external::FileMetadataProvider;
/// use vidshrink_core::CoreResult;
/// use std::path::Path;
///
/// struct FixedSize;
///
/// impl FileMetadataProvider for FixedSize {
///     fn get_size(&self, _path: &Path) -> CoreResult<u64> {
///         Ok(1_000_000)
///     }
/// }
///
/// assert_eq!(FixedSize.get_size(Path::new("/fake/path")).unwrap(), 1_000_000);
/// ```
pub trait FileMetadataProvider {
    /// Gets the size of the file at the given path in bytes.
    fn get_size(&self, path: &Path) -> CoreResult<u64>;
}

/// Standard implementation of FileMetadataProvider using `std::fs::metadata`.
#[derive(Debug, Clone, Default)]
pub struct StdFsMetadataProvider;

impl FileMetadataProvider for StdFsMetadataProvider {
    fn get_size(&self, path: &Path) -> CoreResult<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}

/// Moves a finished replacement over the original.
///
/// Implementations must be atomic: after the call either the original is
/// untouched or it has been fully superseded, never a mix of both.
pub trait FileReplacer {
    fn replace(&self, replacement: &Path, original: &Path) -> io::Result<()>;
}

/// `rename(2)`-based replacement. Both paths live in the same directory, so
/// the rename never crosses a filesystem boundary.
#[derive(Debug, Clone, Default)]
pub struct RenameReplacer;

impl FileReplacer for RenameReplacer {
    fn replace(&self, replacement: &Path, original: &Path) -> io::Result<()> {
        std::fs::rename(replacement, original)?;
        if let Some(dir) = original.parent() {
            sync_parent(dir);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn sync_parent(dir: &Path) {
    if let Err(e) = std::fs::File::open(dir).and_then(|d| d.sync_all()) {
        log::debug!("Failed to fsync directory {}: {}", dir.display(), e);
    }
}

#[cfg(not(unix))]
fn sync_parent(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rename_replacer_supersedes_original() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let original = dir.path().join("a.mp4");
        let replacement = dir.path().join("a.vidshrink-partial.mp4");
        std::fs::write(&original, b"original bytes")?;
        std::fs::write(&replacement, b"new")?;

        RenameReplacer.replace(&replacement, &original)?;

        assert_eq!(std::fs::read(&original)?, b"new");
        assert!(!replacement.exists());
        Ok(())
    }

    #[test]
    fn test_std_metadata_provider() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file = dir.path().join("a.mp4");
        std::fs::write(&file, b"12345")?;
        assert_eq!(StdFsMetadataProvider.get_size(&file)?, 5);
        assert!(StdFsMetadataProvider.get_size(&dir.path().join("missing")).is_err());
        Ok(())
    }

    #[test]
    fn test_check_dependency_missing() {
        let result = check_dependency("vidshrink-surely-not-a-real-binary");
        assert!(matches!(result, Err(CoreError::DependencyNotFound(_))));
    }
}
