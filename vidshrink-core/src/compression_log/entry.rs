//! Log entry types and their on-disk shapes.
//!
//! A compressed entry is persisted as a bare `[before, after]` pair, each an
//! ordered list whose last element is the file size in bytes. Skipped and
//! errored entries are persisted as objects tagged with `"status"`, so a reader
//! can never mistake them for a size pair.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::fmt;

// ============================================================================
// FILE RECORD
// ============================================================================

/// Ordered description of a file at one point in time.
///
/// The last element is the size in bytes. The leading elements are descriptive
/// metadata; they are preserved verbatim across load/save even when nothing in
/// the crate interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct FileRecord {
    metadata: Vec<Value>,
    size_bytes: u64,
}

impl FileRecord {
    #[must_use]
    pub fn new(metadata: Vec<Value>, size_bytes: u64) -> Self {
        Self { metadata, size_bytes }
    }

    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Leading metadata fields, in stored order.
    #[must_use]
    pub fn metadata(&self) -> &[Value] {
        &self.metadata
    }
}

impl TryFrom<Vec<Value>> for FileRecord {
    type Error = String;

    fn try_from(mut values: Vec<Value>) -> Result<Self, Self::Error> {
        let last = values
            .pop()
            .ok_or_else(|| "file record is empty; expected trailing size".to_string())?;
        let size_bytes = last
            .as_u64()
            .ok_or_else(|| format!("file record must end with a byte size, found {last}"))?;
        Ok(Self {
            metadata: values,
            size_bytes,
        })
    }
}

impl From<FileRecord> for Vec<Value> {
    fn from(record: FileRecord) -> Self {
        let mut values = record.metadata;
        values.push(Value::from(record.size_bytes));
        values
    }
}

// ============================================================================
// LOG ENTRY
// ============================================================================

/// Status of a persisted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Compressed,
    Skipped,
    Error,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryStatus::Compressed => "compressed",
            EntryStatus::Skipped => "skipped",
            EntryStatus::Error => "error",
        })
    }
}

/// Which stage an errored item failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Traversal or metadata access failed for the path
    Scan,
    /// Codec detection failed
    Probe,
    /// The encoder failed or produced unusable output
    Encode,
    /// The encoded file could not replace the original
    Replace,
    #[default]
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Scan => "scan",
            FailureKind::Probe => "probe",
            FailureKind::Encode => "encode",
            FailureKind::Replace => "replace",
            FailureKind::Other => "other",
        })
    }
}

/// Persisted outcome for one file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub enum LogEntry {
    /// The file was re-encoded and the original superseded.
    Compressed { before: FileRecord, after: FileRecord },
    /// The file already uses the target codec.
    Skipped { codec: Option<String> },
    /// The item failed; the original file was left untouched.
    Error { kind: FailureKind, message: String },
}

impl LogEntry {
    /// Builds a compressed entry in the layout this crate writes:
    /// `before = [codec, size]`, `after = [codec, recorded_at, size]`.
    #[must_use]
    pub fn compressed(
        source_codec: &str,
        before_size: u64,
        target_codec: &str,
        recorded_at: i64,
        after_size: u64,
    ) -> Self {
        LogEntry::Compressed {
            before: FileRecord::new(vec![Value::from(source_codec)], before_size),
            after: FileRecord::new(
                vec![Value::from(target_codec), Value::from(recorded_at)],
                after_size,
            ),
        }
    }

    #[must_use]
    pub fn skipped(codec: impl Into<String>) -> Self {
        LogEntry::Skipped {
            codec: Some(codec.into()),
        }
    }

    #[must_use]
    pub fn error(kind: FailureKind, message: impl Into<String>) -> Self {
        LogEntry::Error {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> EntryStatus {
        match self {
            LogEntry::Compressed { .. } => EntryStatus::Compressed,
            LogEntry::Skipped { .. } => EntryStatus::Skipped,
            LogEntry::Error { .. } => EntryStatus::Error,
        }
    }

    /// `(before, after)` sizes for compressed entries.
    #[must_use]
    pub fn sizes(&self) -> Option<(u64, u64)> {
        match self {
            LogEntry::Compressed { before, after } => {
                Some((before.size_bytes(), after.size_bytes()))
            }
            _ => None,
        }
    }

    /// Unix timestamp at which a compressed entry was recorded, if the entry
    /// was written with one.
    #[must_use]
    pub fn recorded_at(&self) -> Option<i64> {
        match self {
            LogEntry::Compressed { after, .. } if after.metadata().len() >= 2 => {
                after.metadata()[1].as_i64()
            }
            _ => None,
        }
    }
}

// ============================================================================
// ON-DISK SHAPES
// ============================================================================

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Pair(FileRecord, FileRecord),
    Tagged(TaggedEntry),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum TaggedEntry {
    Skipped {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        codec: Option<String>,
    },
    Error {
        #[serde(default)]
        kind: FailureKind,
        message: String,
    },
}

impl From<RawEntry> for LogEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Pair(before, after) => LogEntry::Compressed { before, after },
            RawEntry::Tagged(TaggedEntry::Skipped { codec }) => LogEntry::Skipped { codec },
            RawEntry::Tagged(TaggedEntry::Error { kind, message }) => {
                LogEntry::Error { kind, message }
            }
        }
    }
}

impl From<LogEntry> for RawEntry {
    fn from(entry: LogEntry) -> Self {
        match entry {
            LogEntry::Compressed { before, after } => RawEntry::Pair(before, after),
            LogEntry::Skipped { codec } => RawEntry::Tagged(TaggedEntry::Skipped { codec }),
            LogEntry::Error { kind, message } => {
                RawEntry::Tagged(TaggedEntry::Error { kind, message })
            }
        }
    }
}
