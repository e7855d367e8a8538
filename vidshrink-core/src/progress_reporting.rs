//! Progress Reporting API
//!
//! This module defines the display-only surface the pipeline updates while it
//! runs: which file is being worked on, how far its encode has got, and the
//! running counts for this run. Nothing reported here is persisted, and a
//! reporter that ignores every call leaves the run's outcome unchanged.
//!
//! # Design Decisions
//! - The reporter is passed to the pipeline explicitly, never installed globally
//! - Methods take `&self`; implementations use interior mutability if needed

pub mod ffmpeg_handler;

use crate::compression_log::EntryStatus;
use crate::external::EncodeProgress;
use crate::utils::format_duration;
use std::path::Path;

/// Cumulative per-run item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    /// Items compressed in this run
    pub compressed: usize,
    /// Items found to be in the target codec already
    pub skipped: usize,
    /// Items that failed in this run
    pub errored: usize,
    /// Items passed over because the log already settled them
    pub already_done: usize,
}

impl RunCounts {
    /// Items this run has settled one way or another
    #[must_use]
    pub fn total(&self) -> usize {
        self.compressed + self.skipped + self.errored + self.already_done
    }

    pub(crate) fn bump(&mut self, status: EntryStatus) {
        match status {
            EntryStatus::Compressed => self.compressed += 1,
            EntryStatus::Skipped => self.skipped += 1,
            EntryStatus::Error => self.errored += 1,
        }
    }
}

/// Receives progress updates from the pipeline
pub trait ProgressReporter {
    /// A candidate is about to be probed and possibly encoded
    fn item_started(&self, path: &Path, counts: &RunCounts);

    /// The encoder reported progress for the current item
    fn encode_progress(&self, path: &Path, progress: &EncodeProgress);

    /// The current item's outcome has been recorded
    fn item_finished(&self, path: &Path, status: EntryStatus, counts: &RunCounts);

    /// No further items will be started
    fn run_finished(&self, counts: &RunCounts);
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn item_started(&self, _path: &Path, _counts: &RunCounts) {}
    fn encode_progress(&self, _path: &Path, _progress: &EncodeProgress) {}
    fn item_finished(&self, _path: &Path, _status: EntryStatus, _counts: &RunCounts) {}
    fn run_finished(&self, _counts: &RunCounts) {}
}

/// Reporter that writes one log line per event.
///
/// Encode progress is left to the milestone lines of the ffmpeg handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn item_started(&self, path: &Path, counts: &RunCounts) {
        log::info!("[{}] Processing {}", counts.total() + 1, path.display());
    }

    fn encode_progress(&self, path: &Path, progress: &EncodeProgress) {
        log::trace!(
            "{}: {} at {:.2}x",
            path.display(),
            format_duration(progress.media_secs),
            progress.speed
        );
    }

    fn item_finished(&self, path: &Path, status: EntryStatus, counts: &RunCounts) {
        log::info!(
            "{} -> {} (compressed {}, skipped {}, errors {})",
            path.display(),
            status,
            counts.compressed,
            counts.skipped,
            counts.errored
        );
    }

    fn run_finished(&self, counts: &RunCounts) {
        log::debug!("Run finished after {} items", counts.total());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_counts_bump_and_total() {
        let mut counts = RunCounts::default();
        counts.bump(EntryStatus::Compressed);
        counts.bump(EntryStatus::Skipped);
        counts.bump(EntryStatus::Error);
        counts.bump(EntryStatus::Error);
        counts.already_done = 3;

        assert_eq!(counts.compressed, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.errored, 2);
        assert_eq!(counts.total(), 7);
    }
}
