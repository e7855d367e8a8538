//! Summary reporting.
//!
//! The summary is computed purely from the persisted log, so a run that
//! resumed earlier work reports the same totals as one that did everything in
//! a single pass. It is only ever produced for a run whose scan was fully
//! consumed.

use crate::compression_log::{CompressionLog, EntryStatus};
use crate::processing::RunStats;
use crate::utils::{format_bytes, format_gigabytes, retained_percent};
use std::fmt;

/// Whole-log totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_before: u64,
    pub total_after: u64,
    pub compressed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl Summary {
    /// Aggregates every entry in the log. Byte totals cover `compressed`
    /// entries only; the other statuses are counted.
    #[must_use]
    pub fn from_log(log: &CompressionLog) -> Self {
        let mut summary = Summary::default();
        for (_, entry) in log.entries() {
            match entry.status() {
                EntryStatus::Compressed => {
                    if let Some((before, after)) = entry.sizes() {
                        summary.total_before = summary.total_before.saturating_add(before);
                        summary.total_after = summary.total_after.saturating_add(after);
                    }
                    summary.compressed += 1;
                }
                EntryStatus::Skipped => summary.skipped += 1,
                EntryStatus::Error => summary.errors += 1,
            }
        }
        summary
    }

    /// `total_after / total_before`, undefined without compressed bytes.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        if self.compressed == 0 || self.total_before == 0 {
            None
        } else {
            Some(self.total_after as f64 / self.total_before as f64)
        }
    }

    /// Percentage of the original size retained.
    #[must_use]
    pub fn retained_percent(&self) -> Option<f64> {
        if self.compressed == 0 {
            return None;
        }
        retained_percent(self.total_before, self.total_after)
    }

    #[must_use]
    pub fn saved_bytes(&self) -> u64 {
        self.total_before.saturating_sub(self.total_after)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compression summary")?;
        writeln!(f, "  {:<26}{}", "Files compressed:", self.compressed)?;
        writeln!(f, "  {:<26}{}", "Files already in target:", self.skipped)?;
        writeln!(f, "  {:<26}{}", "Files with errors:", self.errors)?;
        match self.retained_percent() {
            Some(pct) => {
                writeln!(f, "  {:<26}{}", "Total original size:", format_gigabytes(self.total_before))?;
                writeln!(f, "  {:<26}{}", "Total compressed size:", format_gigabytes(self.total_after))?;
                writeln!(f, "  {:<26}{}", "Space saved:", format_gigabytes(self.saved_bytes()))?;
                write!(f, "  {:<26}{:.1}% of original", "Size retained:", pct)
            }
            None => write!(f, "  No files have been compressed yet."),
        }
    }
}

/// The end-of-run report: what this run did, then the whole-log summary.
#[derive(Debug, Clone, Copy)]
pub struct RunReport<'a> {
    pub run: &'a RunStats,
    pub summary: Summary,
}

impl<'a> RunReport<'a> {
    #[must_use]
    pub fn new(run: &'a RunStats, log: &CompressionLog) -> Self {
        Self {
            run,
            summary: Summary::from_log(log),
        }
    }
}

impl fmt::Display for RunReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.run.compressed.is_empty() {
            writeln!(f, "Compressed in this run:")?;
            for item in &self.run.compressed {
                writeln!(
                    f,
                    "  {}: {} -> {}",
                    item.path.display(),
                    format_bytes(item.before_size),
                    format_bytes(item.after_size)
                )?;
            }
            writeln!(f)?;
        }

        if !self.run.failed.is_empty() {
            writeln!(f, "Errors in this run:")?;
            for item in &self.run.failed {
                writeln!(f, "  [{}] {}: {}", item.kind, item.path.display(), item.message)?;
            }
            writeln!(f)?;
        }

        let replace_failures = self.run.replace_failures().count();
        if replace_failures > 0 {
            writeln!(
                f,
                "WARNING: {replace_failures} encoded file(s) could not replace their original; \
                 the originals are intact and the encodes were left beside them"
            )?;
            writeln!(f)?;
        }

        write!(f, "{}", self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression_log::{FailureKind, LogEntry};
    use crate::processing::{FailedItem, RunStats};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn sample_log(dir: &Path) -> Result<CompressionLog, Box<dyn std::error::Error>> {
        let mut log = CompressionLog::load(dir)?;
        log.record(&dir.join("a.mp4"), LogEntry::compressed("h264", 100, "hevc", 1, 40))?;
        log.record(&dir.join("b.mp4"), LogEntry::compressed("h264", 200, "hevc", 1, 70))?;
        log.record(&dir.join("c.mkv"), LogEntry::skipped("hevc"))?;
        log.record(&dir.join("d.mov"), LogEntry::error(FailureKind::Probe, "unreadable"))?;
        Ok(log)
    }

    #[test]
    fn test_summary_accounting() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let summary = Summary::from_log(&sample_log(dir.path())?);

        assert_eq!(summary.total_before, 300);
        assert_eq!(summary.total_after, 110);
        assert_eq!(summary.compressed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 1);
        let ratio = summary.ratio().unwrap();
        assert!((ratio - 0.3667).abs() < 0.001);
        assert!(summary.to_string().contains("36.7% of original"));
        Ok(())
    }

    #[test]
    fn test_summary_without_compressed_entries() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut log = CompressionLog::load(dir.path())?;
        log.record(&dir.path().join("c.mkv"), LogEntry::skipped("hevc"))?;

        let summary = Summary::from_log(&log);
        assert_eq!(summary.ratio(), None);
        let text = summary.to_string();
        assert!(text.contains("No files have been compressed yet."));
        assert!(!text.contains('%'));
        Ok(())
    }

    #[test]
    fn test_summary_uses_decimal_gigabytes() {
        let summary = Summary {
            total_before: 3_000_000_000,
            total_after: 1_000_000_000,
            compressed: 1,
            ..Summary::default()
        };
        let text = summary.to_string();
        assert!(text.contains("3.00 GB"));
        assert!(text.contains("1.00 GB"));
        assert!(text.contains("33.3% of original"));
    }

    #[test]
    fn test_run_report_lists_failures() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let log = sample_log(dir.path())?;
        let run = RunStats {
            failed: vec![FailedItem {
                path: PathBuf::from("/videos/e.mp4"),
                kind: FailureKind::Replace,
                message: "cross-device link".to_string(),
            }],
            ..RunStats::default()
        };

        let text = RunReport::new(&run, &log).to_string();
        assert!(text.contains("[replace] /videos/e.mp4: cross-device link"));
        assert!(text.contains("could not replace their original"));
        assert!(text.contains("Files compressed:"));
        Ok(())
    }
}
