//! Tree scanner for finding video files to process.
//!
//! A run starts from a root that is either a directory (recursive batch mode)
//! or a single file. Directory roots are walked to unbounded depth with entries
//! sorted by file name at every level, so repeated runs enumerate candidates in
//! the same order and resume behaves predictably.
//!
//! The log's location is derived from the root alone: the directory itself, or
//! the parent of a single-file root. Nothing outside the root is inspected.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::temp_files::is_partial_output;

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

// ============================================================================
// ROOT RESOLUTION
// ============================================================================

/// Whether the run covers a directory tree or a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Directory,
    File,
}

/// A canonicalized root and the directory its compression log lives in.
#[derive(Debug, Clone)]
pub struct ScanRoot {
    root: PathBuf,
    base_dir: PathBuf,
    kind: RootKind,
}

impl ScanRoot {
    /// Resolves the user-supplied path into an absolute root.
    ///
    /// # Errors
    ///
    /// * `CoreError::RootInaccessible` - the path does not exist or cannot be read
    /// * `CoreError::PathError` - the path is neither a file nor a directory
    pub fn resolve(path: &Path) -> CoreResult<Self> {
        let root = path
            .canonicalize()
            .map_err(|source| CoreError::RootInaccessible {
                path: path.to_path_buf(),
                source,
            })?;
        let metadata = std::fs::metadata(&root).map_err(|source| CoreError::RootInaccessible {
            path: root.clone(),
            source,
        })?;

        if metadata.is_dir() {
            Ok(Self {
                base_dir: root.clone(),
                root,
                kind: RootKind::Directory,
            })
        } else if metadata.is_file() {
            let base_dir = root
                .parent()
                .ok_or_else(|| {
                    CoreError::PathError(format!(
                        "Could not determine parent directory for file '{}'",
                        root.display()
                    ))
                })?
                .to_path_buf();
            Ok(Self {
                root,
                base_dir,
                kind: RootKind::File,
            })
        } else {
            Err(CoreError::PathError(format!(
                "Root '{}' is neither a file nor a directory",
                root.display()
            )))
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `compression_log.json` for this root.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn kind(&self) -> RootKind {
        self.kind
    }
}

// ============================================================================
// SCANNING
// ============================================================================

/// A traversal failure for one path. The scan continues past it.
#[derive(Debug, Clone)]
pub struct ScanError {
    /// Path the failure relates to, when traversal could name one
    pub path: Option<PathBuf>,
    pub message: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// One element of the candidate sequence.
pub type ScanItem = Result<PathBuf, ScanError>;

/// Produces the candidate sequence for a root. Each call to [`Scanner::iter`]
/// starts a fresh traversal, so the sequence is restartable.
pub struct Scanner<'a> {
    root: &'a ScanRoot,
    config: &'a CoreConfig,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(root: &'a ScanRoot, config: &'a CoreConfig) -> Self {
        Self { root, config }
    }

    /// Starts a lazy traversal of the root.
    #[must_use]
    pub fn iter(&self) -> ScanIter<'a> {
        match self.root.kind() {
            RootKind::File => ScanIter::Single(Some(self.root.root().to_path_buf())),
            RootKind::Directory => ScanIter::Walk {
                walker: WalkDir::new(self.root.root())
                    .follow_links(true)
                    .sort_by_file_name()
                    .into_iter(),
                config: self.config,
            },
        }
    }
}

/// Iterator returned by [`Scanner::iter`].
pub enum ScanIter<'a> {
    Single(Option<PathBuf>),
    Walk {
        walker: walkdir::IntoIter,
        config: &'a CoreConfig,
    },
}

impl Iterator for ScanIter<'_> {
    type Item = ScanItem;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ScanIter::Single(path) => path.take().map(Ok),
            ScanIter::Walk { walker, config } => loop {
                match walker.next()? {
                    Ok(entry) => {
                        if entry.file_type().is_file() && is_candidate(entry.path(), config) {
                            return Some(Ok(entry.into_path()));
                        }
                    }
                    Err(err) => {
                        log::warn!("Traversal error: {err}");
                        return Some(Err(ScanError {
                            path: err.path().map(Path::to_path_buf),
                            message: err.to_string(),
                        }));
                    }
                }
            },
        }
    }
}

/// Returns true if `path` has a video extension and is not one of our own
/// partial outputs.
#[must_use]
pub fn is_candidate(path: &Path, config: &CoreConfig) -> bool {
    let has_video_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| config.is_video_extension(ext));
    has_video_ext && !is_partial_output(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_candidate() {
        let config = CoreConfig::default();
        assert!(is_candidate(Path::new("/v/a.mp4"), &config));
        assert!(is_candidate(Path::new("/v/a.MOV"), &config));
        assert!(!is_candidate(Path::new("/v/a.txt"), &config));
        assert!(!is_candidate(Path::new("/v/compression_log.json"), &config));
        assert!(!is_candidate(Path::new("/v/a.vidshrink-partial.mp4"), &config));
        assert!(!is_candidate(Path::new("/v/mp4"), &config));
    }
}
