// ============================================================================
// vidshrink-core/src/processing/pipeline.rs
// ============================================================================
//
// PIPELINE DRIVER: Scan, Decide, Process, Record
//
// The driver pulls candidates from the scanner one at a time, consults the
// compression log to decide whether each needs work, hands it to the worker,
// and records the outcome before pulling the next candidate. That ordering is
// what makes a restarted run resume where the previous one stopped.
//
// KEY COMPONENTS:
// - run_pipeline: the sequential driver
// - resume_decision: whether a logged path still needs processing
// - RunOutcome / RunStats: what this run did, for the report
//
// AI-ASSISTANT-INFO: Sequential resumable driver; the only writer of the log

// ---- Internal crate imports ----
use super::worker::{ItemOutcome, TranscodeWorker, WorkItem};
use crate::compression_log::{CompressionLog, EntryStatus, FailureKind, LogEntry};
use crate::discovery::{RootKind, ScanRoot, Scanner};
use crate::error::CoreResult;
use crate::external::{CodecProber, Encoder, FileMetadataProvider, FileReplacer};
use crate::progress_reporting::{ProgressReporter, RunCounts};

// ---- Standard library imports ----
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::UNIX_EPOCH;

// ============================================================================
// TYPES
// ============================================================================

/// A file compressed during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedItem {
    pub path: PathBuf,
    pub before_size: u64,
    pub after_size: u64,
}

/// A path that failed during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// What this run did, as opposed to what the log holds overall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub counts: RunCounts,
    pub compressed: Vec<CompressedItem>,
    pub failed: Vec<FailedItem>,
}

impl RunStats {
    /// Number of items this run handed to the worker.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.counts.compressed + self.counts.skipped + self.counts.errored
    }

    /// Failures where an encode finished but could not replace the original.
    pub fn replace_failures(&self) -> impl Iterator<Item = &FailedItem> {
        self.failed.iter().filter(|f| f.kind == FailureKind::Replace)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The scanner's sequence was fully consumed
    Completed(RunStats),
    /// Cancellation stopped the run before the sequence was consumed
    Interrupted(RunStats),
}

impl RunOutcome {
    #[must_use]
    pub fn stats(&self) -> &RunStats {
        match self {
            RunOutcome::Completed(stats) | RunOutcome::Interrupted(stats) => stats,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Whether a candidate needs work given its log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    Process,
    AlreadyDone(EntryStatus),
}

// ============================================================================
// RESUME RULES
// ============================================================================

/// Decides whether `path` must be processed.
///
/// `compressed` entries are honoured unless the file was modified after the
/// entry was recorded and its size no longer matches the recorded `after`
/// size; `skipped` entries are always honoured; `error` entries are retried.
#[must_use]
pub fn resume_decision(path: &Path, entry: Option<&LogEntry>) -> ResumeDecision {
    let Some(entry) = entry else {
        return ResumeDecision::Process;
    };

    match entry.status() {
        EntryStatus::Skipped => ResumeDecision::AlreadyDone(EntryStatus::Skipped),
        EntryStatus::Error => ResumeDecision::Process,
        EntryStatus::Compressed => {
            let (Some(recorded_at), Some((_, after_size))) = (entry.recorded_at(), entry.sizes())
            else {
                return ResumeDecision::AlreadyDone(EntryStatus::Compressed);
            };
            let Some(current) = current_state(path) else {
                return ResumeDecision::Process;
            };
            if current.mtime <= recorded_at {
                return ResumeDecision::AlreadyDone(EntryStatus::Compressed);
            }
            if current.size == after_size {
                // Touched (tagger, rsync -t, clock skew) but not replaced
                log::debug!(
                    "{} has a newer mtime but the compressed size, keeping entry",
                    path.display()
                );
                return ResumeDecision::AlreadyDone(EntryStatus::Compressed);
            }
            log::info!(
                "{} changed since it was compressed, processing again",
                path.display()
            );
            ResumeDecision::Process
        }
    }
}

struct FileState {
    mtime: i64,
    size: u64,
}

fn current_state(path: &Path) -> Option<FileState> {
    let metadata = std::fs::metadata(path).ok()?;
    let secs = metadata
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_secs();
    Some(FileState {
        mtime: i64::try_from(secs).ok()?,
        size: metadata.len(),
    })
}

// ============================================================================
// DRIVER
// ============================================================================

/// Runs the pipeline over `root`, strictly one item at a time.
///
/// `cancel` is checked before each candidate is pulled from the scanner; an
/// item already started always runs to completion and is recorded.
///
/// # Errors
///
/// * `CoreError::LogWrite` - an outcome could not be made durable. The run
///   stops at once since further work could not be resumed correctly.
pub fn run_pipeline<P, E, M, R, Rep>(
    root: &ScanRoot,
    log: &mut CompressionLog,
    worker: &TranscodeWorker<P, E, M, R>,
    reporter: &Rep,
    cancel: &AtomicBool,
) -> CoreResult<RunOutcome>
where
    P: CodecProber,
    E: Encoder,
    M: FileMetadataProvider,
    R: FileReplacer,
    Rep: ProgressReporter + ?Sized,
{
    let scanner = Scanner::new(root, worker.config());
    let mut candidates = scanner.iter();
    let mut stats = RunStats::default();
    let mut recorded: HashSet<PathBuf> = HashSet::new();

    log::info!(
        "Scanning {} (log: {})",
        root.root().display(),
        log.path().display()
    );

    loop {
        if cancel.load(Ordering::SeqCst) {
            log::warn!("Interrupted; not starting further items");
            reporter.run_finished(&stats.counts);
            return Ok(RunOutcome::Interrupted(stats));
        }

        let Some(next) = candidates.next() else {
            break;
        };

        let path = match next {
            Ok(path) => path,
            Err(scan_err) => {
                stats.counts.errored += 1;
                match scan_err.path {
                    Some(path) => {
                        log.record(&path, LogEntry::error(FailureKind::Scan, &scan_err.message))?;
                        recorded.insert(path.clone());
                        stats.failed.push(FailedItem {
                            path,
                            kind: FailureKind::Scan,
                            message: scan_err.message,
                        });
                    }
                    None => log::error!("Scan error without a path: {}", scan_err.message),
                }
                continue;
            }
        };

        let previous = log.lookup(&path);
        if let ResumeDecision::AlreadyDone(status) = resume_decision(&path, previous) {
            log::debug!("Already {}: {}", status, path.display());
            stats.counts.already_done += 1;
            continue;
        }
        let previous_status = previous.map(LogEntry::status);

        reporter.item_started(&path, &stats.counts);
        let mut item = WorkItem::new(path.clone());
        let outcome = worker.process(&mut item, &mut |progress| {
            reporter.encode_progress(&path, &progress)
        });

        // A re-examined file that is still in the target codec is the file we
        // produced; its compressed entry keeps the real before/after sizes
        if previous_status == Some(EntryStatus::Compressed)
            && matches!(outcome, ItemOutcome::Skipped { .. })
        {
            log::info!(
                "{} is still {}, keeping its compressed entry",
                path.display(),
                worker.config().target_codec
            );
            stats.counts.already_done += 1;
            reporter.item_finished(&path, EntryStatus::Compressed, &stats.counts);
            continue;
        }

        let recorded_at = chrono::Utc::now().timestamp();
        log.record(&path, outcome.to_log_entry(worker.config(), recorded_at))?;
        recorded.insert(path.clone());

        let status = outcome.status();
        stats.counts.bump(status);
        match outcome {
            ItemOutcome::Compressed {
                before_size,
                after_size,
                ..
            } => stats.compressed.push(CompressedItem {
                path: path.clone(),
                before_size,
                after_size,
            }),
            ItemOutcome::Failed { kind, message } => stats.failed.push(FailedItem {
                path: path.clone(),
                kind,
                message,
            }),
            ItemOutcome::Skipped { .. } => {}
        }
        reporter.item_finished(&path, status, &stats.counts);
    }

    if root.kind() == RootKind::Directory {
        let stale = stale_scan_errors(root, log, &recorded);
        let cleared = log.remove(&stale)?;
        if cleared > 0 {
            log::info!("Cleared {} scan error(s) that no longer occur", cleared);
        }
    }

    reporter.run_finished(&stats.counts);
    log::info!(
        "Scan complete: {} compressed, {} skipped, {} errors, {} already done",
        stats.counts.compressed,
        stats.counts.skipped,
        stats.counts.errored,
        stats.counts.already_done
    );
    Ok(RunOutcome::Completed(stats))
}

/// Scan-error entries under `root` that this fully consumed walk did not
/// record again. Their paths now walk cleanly or no longer exist.
fn stale_scan_errors(
    root: &ScanRoot,
    log: &CompressionLog,
    recorded: &HashSet<PathBuf>,
) -> Vec<PathBuf> {
    log.entries()
        .filter(|(_, entry)| {
            matches!(
                entry,
                LogEntry::Error {
                    kind: FailureKind::Scan,
                    ..
                }
            )
        })
        .map(|(key, _)| PathBuf::from(key))
        .filter(|path| path.starts_with(root.root()) && !recorded.contains(path))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
