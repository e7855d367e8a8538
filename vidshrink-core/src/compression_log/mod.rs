// ============================================================================
// vidshrink-core/src/compression_log/mod.rs
// ============================================================================
//
// COMPRESSION LOG: Durable Per-File Outcome Store
//
// The compression log maps absolute file paths to the outcome of processing
// them. It is the only record of which files were already transformed, so
// every mutation is flushed to disk before the pipeline moves on.
//
// PERSISTENCE MODEL:
// Each `record` serializes the whole map into a temporary file in the log's
// own directory, fsyncs it, and atomically renames it over
// `compression_log.json`, then fsyncs the directory. A crash at any point
// leaves either the previous complete log or the new complete log on disk,
// never a torn one.
//
// AI-ASSISTANT-INFO: Crash-safe JSON store keyed by absolute path

mod entry;

pub use entry::{EntryStatus, FailureKind, FileRecord, LogEntry};

use crate::config::{LOG_FILE_NAME, TargetCodec};
use crate::error::{CoreError, CoreResult};
use crate::external::ProbeResult;

use log::{debug, info};
use tempfile::NamedTempFile;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// STORE
// ============================================================================

/// In-memory view of `compression_log.json` plus the path it persists to.
///
/// Entries are kept in a `BTreeMap` so that lookups are O(log n) and the
/// persisted file has a stable key order across runs.
#[derive(Debug)]
pub struct CompressionLog {
    path: PathBuf,
    entries: BTreeMap<String, LogEntry>,
}

impl CompressionLog {
    /// Loads the log stored in `base_dir`, or returns an empty log if none
    /// exists yet.
    ///
    /// Only `base_dir` itself is consulted; parent and sibling directories are
    /// never searched.
    ///
    /// # Errors
    ///
    /// * `CoreError::CorruptLog` - the file exists but is not a valid log
    /// * `CoreError::Io` - the file exists but cannot be read
    pub fn load(base_dir: &Path) -> CoreResult<Self> {
        let path = base_dir.join(LOG_FILE_NAME);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No compression log at {}, starting fresh", path.display());
                return Ok(Self {
                    path,
                    entries: BTreeMap::new(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let entries: BTreeMap<String, LogEntry> =
            serde_json::from_reader(BufReader::new(file))
                .map_err(|source| CoreError::CorruptLog {
                    path: path.clone(),
                    source,
                })?;

        info!(
            "Loaded compression log {} ({} entries)",
            path.display(),
            entries.len()
        );
        Ok(Self { path, entries })
    }

    /// Path of the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn lookup(&self, path: &Path) -> Option<&LogEntry> {
        self.entries.get(&key_for(path))
    }

    /// Iterates over all entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &LogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Inserts or supersedes the entry for `path` and makes it durable.
    ///
    /// When this returns `Ok`, the entry survives a crash and is returned by the
    /// next `load`. On `Err` the in-memory state is rolled back, so memory never
    /// claims more than the disk does.
    pub fn record(&mut self, path: &Path, entry: LogEntry) -> CoreResult<()> {
        let key = key_for(path);
        debug!("Recording {} entry for {}", entry.status(), key);

        let previous = self.entries.insert(key.clone(), entry);
        if let Err(e) = self.persist() {
            match previous {
                Some(prev) => self.entries.insert(key, prev),
                None => self.entries.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Removes the entries for `paths` and makes the removal durable.
    ///
    /// Returns how many entries were removed. On `Err` the removed entries are
    /// restored in memory.
    pub fn remove(&mut self, paths: &[PathBuf]) -> CoreResult<usize> {
        let removed: Vec<(String, LogEntry)> = paths
            .iter()
            .filter_map(|path| {
                let key = key_for(path);
                self.entries.remove(&key).map(|entry| (key, entry))
            })
            .collect();
        if removed.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.persist() {
            self.entries.extend(removed);
            return Err(e);
        }
        debug!("Removed {} entries from {}", removed.len(), self.path.display());
        Ok(removed.len())
    }

    /// Writes the full log atomically.
    pub fn persist(&self) -> CoreResult<()> {
        self.write_atomically().map_err(|source| CoreError::LogWrite {
            path: self.path.clone(),
            source,
        })
    }

    fn write_atomically(&self) -> io::Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::Builder::new()
            .prefix(".compression_log.")
            .suffix(".tmp")
            .tempfile_in(dir)?;

        serde_json::to_writer_pretty(tmp.as_file_mut(), &self.entries)
            .map_err(io::Error::other)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.as_file().sync_all()?;

        persist_tempfile(tmp, &self.path)?;
        sync_dir(dir)
    }
}

fn persist_tempfile(tmp: NamedTempFile, target: &Path) -> io::Result<()> {
    tmp.persist(target).map(|_| ()).map_err(|e| e.error)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Log key for a path. Callers pass absolute paths produced by the scanner.
fn key_for(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ============================================================================
// CODEC PREDICATE
// ============================================================================

/// Returns true if the probed file already uses the target codec and should
/// be recorded as skipped without invoking the encoder.
#[must_use]
pub fn is_target_codec(probe: &ProbeResult, target: TargetCodec) -> bool {
    target.matches(&probe.codec_name)
}
