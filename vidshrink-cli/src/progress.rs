// ============================================================================
// vidshrink-cli/src/progress.rs
// ============================================================================
//
// PROGRESS DISPLAY: indicatif-backed ProgressReporter
//
// Shows one progress bar per file while it encodes. The bar is display-only:
// the pipeline behaves identically with the plain `LogReporter` from
// vidshrink-core, which the CLI uses when stderr is not a terminal or
// --no-progress is given.
//
// The bar lives in a `SharedBar` slot that the logger also holds, so log
// records are printed above the bar instead of through it.
//
// AI-ASSISTANT-INFO: Terminal progress bar for the current encode

// ---- Internal crate imports ----
use crate::config::PROGRESS_TICK_MS;

// ---- External crate imports ----
use indicatif::{ProgressBar, ProgressStyle};
use vidshrink_core::compression_log::EntryStatus;
use vidshrink_core::external::EncodeProgress;
use vidshrink_core::progress_reporting::{ProgressReporter, RunCounts};

// ---- Standard library imports ----
use std::cell::Cell;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Bar resolution; positions are per-mille of the input's duration.
const BAR_LENGTH: u64 = 1000;

/// Slot holding the bar currently on screen, if any.
#[derive(Clone, Default)]
pub struct SharedBar(Arc<Mutex<Option<ProgressBar>>>);

impl SharedBar {
    fn lock(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Puts `bar` in the slot and returns the previous one.
    pub fn replace(&self, bar: Option<ProgressBar>) -> Option<ProgressBar> {
        std::mem::replace(&mut *self.lock(), bar)
    }

    pub fn current(&self) -> Option<ProgressBar> {
        self.lock().clone()
    }

    /// Runs `f` with the bar (if any) cleared from the terminal, then redraws it.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        // Cloned out so the slot is not locked while `f` runs
        match self.current() {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

/// Progress reporter drawing an indicatif bar for the current file.
#[derive(Default)]
pub struct TerminalReporter {
    bar: SharedBar,
    max_position: Cell<u64>,
}

impl TerminalReporter {
    /// Creates a reporter drawing into `bar`. Pass the slot given to
    /// `init_logging` so log lines do not tear the bar.
    pub fn new(bar: SharedBar) -> Self {
        Self {
            bar,
            max_position: Cell::new(0),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("  {prefix} {percent:>3}% [{bar:30}] {elapsed_precise} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##.")
    }

    fn finish_bar(&self) {
        if let Some(bar) = self.bar.replace(None) {
            bar.finish_and_clear();
        }
    }
}

/// Short display name for a path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Bar position for a progress sample; never moves backwards.
pub fn bar_position(progress: &EncodeProgress, current_max: u64) -> u64 {
    let pos = progress
        .fraction
        .map(|f| (f64::from(f) * BAR_LENGTH as f64).round() as u64)
        .unwrap_or(0)
        .min(BAR_LENGTH);
    pos.max(current_max)
}

impl ProgressReporter for TerminalReporter {
    fn item_started(&self, path: &Path, counts: &RunCounts) {
        self.finish_bar();
        let bar = ProgressBar::new(BAR_LENGTH);
        bar.set_style(Self::style());
        bar.set_prefix(format!("[{}] {}", counts.total() + 1, display_name(path)));
        bar.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        self.max_position.set(0);
        self.bar.replace(Some(bar));
    }

    fn encode_progress(&self, _path: &Path, progress: &EncodeProgress) {
        if let Some(bar) = self.bar.current() {
            let pos = bar_position(progress, self.max_position.get());
            self.max_position.set(pos);
            bar.set_position(pos);
            bar.set_message(format!(
                "{} @ {:.2}x",
                vidshrink_core::format_duration(progress.media_secs),
                progress.speed
            ));
        }
    }

    fn item_finished(&self, path: &Path, status: EntryStatus, counts: &RunCounts) {
        self.finish_bar();
        log::info!(
            "{}: {} ({} compressed, {} skipped, {} errors so far)",
            display_name(path),
            status,
            counts.compressed,
            counts.skipped,
            counts.errored
        );
    }

    fn run_finished(&self, _counts: &RunCounts) {
        self.finish_bar();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fraction: Option<f32>) -> EncodeProgress {
        EncodeProgress {
            fraction,
            media_secs: 1.0,
            speed: 1.0,
        }
    }

    #[test]
    fn test_bar_position() {
        assert_eq!(bar_position(&sample(Some(0.25)), 0), 250);
        assert_eq!(bar_position(&sample(Some(1.0)), 0), BAR_LENGTH);
        assert_eq!(bar_position(&sample(None), 0), 0);
        // Backward samples keep the bar where it was
        assert_eq!(bar_position(&sample(Some(0.1)), 400), 400);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/videos/a/clip.mp4")), "clip.mp4");
    }

    #[test]
    fn test_reporter_lifecycle_without_terminal() {
        let shared = SharedBar::default();
        let reporter = TerminalReporter::new(shared.clone());
        let counts = RunCounts::default();
        reporter.item_started(Path::new("/v/a.mp4"), &counts);
        assert!(shared.current().is_some());
        reporter.encode_progress(Path::new("/v/a.mp4"), &sample(Some(0.5)));
        assert_eq!(reporter.max_position.get(), 500);
        reporter.item_finished(Path::new("/v/a.mp4"), EntryStatus::Compressed, &counts);
        assert!(shared.current().is_none());
    }

    #[test]
    fn test_shared_bar_suspend_runs_with_and_without_bar() {
        let shared = SharedBar::default();
        assert_eq!(shared.suspend(|| 1), 1);

        shared.replace(Some(ProgressBar::hidden()));
        assert_eq!(shared.suspend(|| 2), 2);
        assert!(shared.replace(None).is_some());
    }
}
