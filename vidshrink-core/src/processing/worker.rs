// ============================================================================
// vidshrink-core/src/processing/worker.rs
// ============================================================================
//
// TRANSCODING WORKER: One Candidate From Probe to Replacement
//
// The worker takes a single work item through probe, encode, verification and
// atomic replacement, and returns what happened as an `ItemOutcome`. It never
// touches the compression log; the pipeline records the outcome.
//
// Crash-safety rests on two rules enforced here:
// - the encoder only ever writes to the item's partial path, never the original
// - the original is superseded by a single rename after the encode succeeded
//
// AI-ASSISTANT-INFO: Per-file transcode orchestration, returns outcomes only

// ---- Internal crate imports ----
use crate::compression_log::{EntryStatus, FailureKind, LogEntry, is_target_codec};
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::external::{
    CodecProber, EncodeParams, EncodeProgress, Encoder, FileMetadataProvider, FileReplacer,
};
use crate::temp_files::{discard_partial, partial_output_path};
use crate::utils::format_bytes;

// ---- Standard library imports ----
use std::path::{Path, PathBuf};

// ============================================================================
// TYPES
// ============================================================================

/// A candidate file under consideration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub path: PathBuf,
    /// Size when the item was picked up, filled in by the worker
    pub size_bytes: Option<u64>,
    /// Codec of the primary video stream, filled in once probed
    pub codec: Option<String>,
}

impl WorkItem {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            size_bytes: None,
            codec: None,
        }
    }
}

/// What processing one item produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The original was superseded by its target-codec encode
    Compressed {
        source_codec: String,
        before_size: u64,
        after_size: u64,
    },
    /// The file already uses the target codec; the encoder was not invoked
    Skipped { codec: String },
    /// The item failed; the original was left in place
    Failed { kind: FailureKind, message: String },
}

impl ItemOutcome {
    #[must_use]
    pub fn status(&self) -> EntryStatus {
        match self {
            ItemOutcome::Compressed { .. } => EntryStatus::Compressed,
            ItemOutcome::Skipped { .. } => EntryStatus::Skipped,
            ItemOutcome::Failed { .. } => EntryStatus::Error,
        }
    }

    /// Converts the outcome into the entry persisted for it.
    #[must_use]
    pub fn to_log_entry(&self, config: &CoreConfig, recorded_at: i64) -> LogEntry {
        match self {
            ItemOutcome::Compressed {
                source_codec,
                before_size,
                after_size,
            } => LogEntry::compressed(
                source_codec,
                *before_size,
                config.target_codec.probe_name(),
                recorded_at,
                *after_size,
            ),
            ItemOutcome::Skipped { codec } => LogEntry::skipped(codec.clone()),
            ItemOutcome::Failed { kind, message } => LogEntry::error(*kind, message.clone()),
        }
    }

    fn failed(kind: FailureKind, err: &CoreError) -> Self {
        ItemOutcome::Failed {
            kind,
            message: err.to_string(),
        }
    }
}

// ============================================================================
// WORKER
// ============================================================================

/// Drives the external collaborators for one item at a time.
pub struct TranscodeWorker<P, E, M, R> {
    prober: P,
    encoder: E,
    metadata: M,
    replacer: R,
    config: CoreConfig,
}

impl<P, E, M, R> TranscodeWorker<P, E, M, R>
where
    P: CodecProber,
    E: Encoder,
    M: FileMetadataProvider,
    R: FileReplacer,
{
    pub fn new(prober: P, encoder: E, metadata: M, replacer: R, config: CoreConfig) -> Self {
        Self {
            prober,
            encoder,
            metadata,
            replacer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Processes one item. Never fails: every per-item failure becomes a
    /// `Failed` outcome with the original left untouched.
    pub fn process(
        &self,
        item: &mut WorkItem,
        on_progress: &mut dyn FnMut(EncodeProgress),
    ) -> ItemOutcome {
        let path = item.path.clone();

        let before_size = match self.metadata.get_size(&path) {
            Ok(size) => size,
            Err(e) => {
                log::error!("Cannot read size of {}: {}", path.display(), e);
                return ItemOutcome::failed(FailureKind::Scan, &e);
            }
        };
        item.size_bytes = Some(before_size);

        let probe = match self.prober.probe(&path) {
            Ok(probe) => probe,
            Err(e) => {
                log::error!("Probe failed for {}: {}", path.display(), e);
                return ItemOutcome::failed(FailureKind::Probe, &e);
            }
        };
        item.codec = Some(probe.codec_name.clone());

        if is_target_codec(&probe, self.config.target_codec) {
            log::info!(
                "Skipping {}: already {}",
                path.display(),
                probe.codec_name
            );
            return ItemOutcome::Skipped {
                codec: probe.codec_name,
            };
        }

        let partial = partial_output_path(&path);
        // A partial left by a killed run is never trusted
        match discard_partial(&partial) {
            Ok(true) => log::warn!("Discarded stale partial output {}", partial.display()),
            Ok(false) => {}
            Err(e) => {
                log::error!("Cannot remove stale partial {}: {}", partial.display(), e);
                return ItemOutcome::failed(FailureKind::Encode, &e);
            }
        }

        let params = EncodeParams {
            input: path.clone(),
            output: partial.clone(),
            target_codec: self.config.target_codec,
            crf: self.config.crf,
            preset: self.config.preset.clone(),
            copy_audio: self.config.copy_audio,
            duration_secs: probe.duration_secs,
        };

        if let Err(e) = self.encoder.encode(&params, on_progress) {
            log::error!("Encode failed for {}: {}", path.display(), e);
            cleanup_partial(&partial);
            return ItemOutcome::failed(FailureKind::Encode, &e);
        }

        if self.config.verify_output {
            if let Err(e) = self.verify(&partial) {
                log::error!("Encoded output for {} is unusable: {}", path.display(), e);
                cleanup_partial(&partial);
                return ItemOutcome::failed(FailureKind::Encode, &e);
            }
        }

        let encoded_size = match self.metadata.get_size(&partial) {
            Ok(size) => size,
            Err(e) => {
                cleanup_partial(&partial);
                return ItemOutcome::failed(FailureKind::Encode, &e);
            }
        };

        if let Err(source) = self.replacer.replace(&partial, &path) {
            let err = CoreError::ReplaceFailure {
                original: path.clone(),
                replacement: partial.clone(),
                source,
            };
            // The original is intact; the encode stays at the partial path
            // for inspection and is discarded on the next attempt
            log::error!("{}", err);
            return ItemOutcome::failed(FailureKind::Replace, &err);
        }

        let after_size = match self.metadata.get_size(&path) {
            Ok(size) => size,
            Err(e) => {
                log::warn!(
                    "Cannot re-measure {} after replacement ({}), using encoded size",
                    path.display(),
                    e
                );
                encoded_size
            }
        };

        log::info!(
            "Compressed {}: {} -> {}",
            path.display(),
            format_bytes(before_size),
            format_bytes(after_size)
        );

        ItemOutcome::Compressed {
            source_codec: probe.codec_name,
            before_size,
            after_size,
        }
    }

    /// Re-probes an encode and rejects output that is not in the target codec.
    fn verify(&self, output: &Path) -> Result<(), CoreError> {
        let probe = self.prober.probe(output)?;
        if is_target_codec(&probe, self.config.target_codec) {
            Ok(())
        } else {
            Err(CoreError::EncodeFailure(format!(
                "output {} has codec {}, expected {}",
                output.display(),
                probe.codec_name,
                self.config.target_codec
            )))
        }
    }
}

fn cleanup_partial(partial: &Path) {
    if let Err(e) = discard_partial(partial) {
        log::warn!("Failed to remove partial output {}: {}", partial.display(), e);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::{MockEncoder, MockProber};
    use crate::external::{RenameReplacer, StdFsMetadataProvider};
    use std::io;
    use tempfile::tempdir;

    struct FailingReplacer;

    impl FileReplacer for FailingReplacer {
        fn replace(&self, _replacement: &Path, _original: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "injected cross-device rename"))
        }
    }

    fn worker<R: FileReplacer>(
        prober: &MockProber,
        encoder: &MockEncoder,
        replacer: R,
    ) -> TranscodeWorker<MockProber, MockEncoder, StdFsMetadataProvider, R> {
        TranscodeWorker::new(
            prober.clone(),
            encoder.clone(),
            StdFsMetadataProvider,
            replacer,
            CoreConfig::default(),
        )
    }

    #[test]
    fn test_compresses_and_replaces() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let video = dir.path().join("a.mp4");
        std::fs::write(&video, vec![0u8; 100])?;

        let prober = MockProber::new();
        prober.expect_codec(&video, "h264");
        prober.expect_codec(&partial_output_path(&video), "hevc");
        let encoder = MockEncoder::succeeding(&[1u8; 40]);

        let mut item = WorkItem::new(video.clone());
        let outcome = worker(&prober, &encoder, RenameReplacer).process(&mut item, &mut |_| {});

        assert_eq!(
            outcome,
            ItemOutcome::Compressed {
                source_codec: "h264".to_string(),
                before_size: 100,
                after_size: 40,
            }
        );
        assert_eq!(std::fs::read(&video)?, vec![1u8; 40]);
        assert!(!partial_output_path(&video).exists());
        assert_eq!(item.size_bytes, Some(100));
        assert_eq!(item.codec.as_deref(), Some("h264"));
        Ok(())
    }

    #[test]
    fn test_target_codec_is_skipped_without_encoding() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let video = dir.path().join("a.mkv");
        std::fs::write(&video, b"hevc already")?;

        let prober = MockProber::new();
        prober.expect_codec(&video, "hevc");
        let encoder = MockEncoder::succeeding(b"x");

        let outcome = worker(&prober, &encoder, RenameReplacer)
            .process(&mut WorkItem::new(video.clone()), &mut |_| {});

        assert_eq!(outcome.status(), EntryStatus::Skipped);
        assert!(encoder.calls().is_empty());
        assert_eq!(std::fs::read(&video)?, b"hevc already");
        Ok(())
    }

    #[test]
    fn test_encode_failure_discards_partial() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let video = dir.path().join("a.mp4");
        std::fs::write(&video, b"original")?;

        let prober = MockProber::new();
        prober.expect_codec(&video, "h264");
        let encoder = MockEncoder::failing(b"half", "encoder crashed");

        let outcome = worker(&prober, &encoder, RenameReplacer)
            .process(&mut WorkItem::new(video.clone()), &mut |_| {});

        match outcome {
            ItemOutcome::Failed { kind, message } => {
                assert_eq!(kind, FailureKind::Encode);
                assert!(message.contains("encoder crashed"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(std::fs::read(&video)?, b"original");
        assert!(!partial_output_path(&video).exists());
        Ok(())
    }

    #[test]
    fn test_probe_failure_leaves_file_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let video = dir.path().join("broken.mov");
        std::fs::write(&video, b"garbage")?;

        let prober = MockProber::new();
        prober.expect_failure(&video, "moov atom not found");
        let encoder = MockEncoder::succeeding(b"x");

        let outcome = worker(&prober, &encoder, RenameReplacer)
            .process(&mut WorkItem::new(video.clone()), &mut |_| {});

        assert!(matches!(
            outcome,
            ItemOutcome::Failed {
                kind: FailureKind::Probe,
                ..
            }
        ));
        assert!(encoder.calls().is_empty());
        assert_eq!(std::fs::read(&video)?, b"garbage");
        Ok(())
    }

    #[test]
    fn test_replace_failure_keeps_original() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let video = dir.path().join("a.mp4");
        std::fs::write(&video, b"precious original")?;

        let prober = MockProber::new();
        prober.expect_codec(&video, "h264");
        prober.expect_codec(&partial_output_path(&video), "hevc");
        let encoder = MockEncoder::succeeding(b"new");

        let outcome = worker(&prober, &encoder, FailingReplacer)
            .process(&mut WorkItem::new(video.clone()), &mut |_| {});

        assert!(matches!(
            outcome,
            ItemOutcome::Failed {
                kind: FailureKind::Replace,
                ..
            }
        ));
        assert_eq!(std::fs::read(&video)?, b"precious original");
        Ok(())
    }

    #[test]
    fn test_verification_rejects_foreign_codec() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let video = dir.path().join("a.mp4");
        std::fs::write(&video, b"original")?;

        let prober = MockProber::new();
        prober.expect_codec(&video, "h264");
        prober.expect_codec(&partial_output_path(&video), "h264");
        let encoder = MockEncoder::succeeding(b"not really hevc");

        let outcome = worker(&prober, &encoder, RenameReplacer)
            .process(&mut WorkItem::new(video.clone()), &mut |_| {});

        assert_eq!(outcome.status(), EntryStatus::Error);
        assert_eq!(std::fs::read(&video)?, b"original");
        assert!(!partial_output_path(&video).exists());
        Ok(())
    }

    #[test]
    fn test_stale_partial_is_discarded_before_encoding() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let video = dir.path().join("a.mkv");
        std::fs::write(&video, vec![0u8; 50])?;
        std::fs::write(partial_output_path(&video), b"left by a killed run")?;

        let prober = MockProber::new();
        prober.expect_codec(&video, "mpeg4");
        prober.expect_codec(&partial_output_path(&video), "hevc");
        let encoder = MockEncoder::succeeding(&[2u8; 20]);

        let outcome = worker(&prober, &encoder, RenameReplacer)
            .process(&mut WorkItem::new(video.clone()), &mut |_| {});

        assert_eq!(outcome.status(), EntryStatus::Compressed);
        assert_eq!(std::fs::read(&video)?, vec![2u8; 20]);
        Ok(())
    }

    #[test]
    fn test_outcome_to_log_entry() {
        let config = CoreConfig::default();
        let entry = ItemOutcome::Compressed {
            source_codec: "h264".into(),
            before_size: 100,
            after_size: 40,
        }
        .to_log_entry(&config, 1_700_000_000);
        assert_eq!(entry.sizes(), Some((100, 40)));
        assert_eq!(entry.recorded_at(), Some(1_700_000_000));

        let entry = ItemOutcome::Failed {
            kind: FailureKind::Probe,
            message: "bad".into(),
        }
        .to_log_entry(&config, 0);
        assert_eq!(entry.status(), EntryStatus::Error);
    }
}
