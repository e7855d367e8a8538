//! Implementation of the compression run.
//!
//! Builds the core configuration from the parsed arguments, resolves the root,
//! loads its compression log, checks for ffmpeg and ffprobe, and hands over to
//! the vidshrink-core pipeline. The report is printed only for a run that
//! consumed its whole scan.

use crate::cli::CompressArgs;
use crate::error::CliResult;
use crate::progress::{SharedBar, TerminalReporter};

use vidshrink_core::external::{
    ChildTracker, FfmpegEncoder, FfprobeProber, RenameReplacer, SidecarSpawner,
    StdFsMetadataProvider, check_dependency,
};
use vidshrink_core::processing::{RunOutcome, TranscodeWorker, run_pipeline};
use vidshrink_core::progress_reporting::{LogReporter, ProgressReporter};
use vidshrink_core::{CompressionLog, CoreConfig, RunReport, ScanRoot};

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use log::{debug, info, warn};

/// How a compression run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressStatus {
    Completed,
    Interrupted,
}

/// Creates and validates a CoreConfig from CLI arguments.
pub fn build_core_config(args: &CompressArgs) -> CliResult<CoreConfig> {
    let mut config = CoreConfig::for_codec(args.codec);
    if let Some(crf) = args.crf {
        config.crf = crf;
    }
    config.preset = args.preset.clone();
    if let Some(extensions) = &args.extensions {
        config.extensions = extensions
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
    }
    config.verify_output = !args.no_verify;
    config.validate()?;
    Ok(config)
}

/// Runs a compression pass over `args.path`.
///
/// The pid of each ffmpeg child is published into `encoder_child`. With
/// `progress` set, a bar is drawn into that slot; otherwise progress is
/// logged.
///
/// # Errors
///
/// Fatal errors only: invalid configuration, an inaccessible root, a corrupt
/// log, missing ffmpeg/ffprobe, or a log write that could not be made durable.
pub fn run_compress(
    args: &CompressArgs,
    cancel: &AtomicBool,
    encoder_child: &ChildTracker,
    progress: Option<&SharedBar>,
) -> CliResult<CompressStatus> {
    let start_time = Instant::now();
    let config = build_core_config(args)?;
    debug!("Core config: {:?}", config);

    let root = ScanRoot::resolve(&args.path)?;
    // The log is checked before the tools so a corrupt log is reported
    // even on a machine without ffmpeg
    let mut log = CompressionLog::load(root.base_dir())?;

    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;

    info!(
        "Target codec {} (crf {}{}), root {}",
        config.target_codec,
        config.crf,
        config
            .preset
            .as_deref()
            .map(|p| format!(", preset {p}"))
            .unwrap_or_default(),
        root.root().display()
    );

    let worker = TranscodeWorker::new(
        FfprobeProber::new(),
        FfmpegEncoder::new(SidecarSpawner::with_tracker(encoder_child.clone())),
        StdFsMetadataProvider,
        RenameReplacer,
        config,
    );

    let reporter: Box<dyn ProgressReporter> = match progress {
        Some(bar) => Box::new(TerminalReporter::new(bar.clone())),
        None => Box::new(LogReporter),
    };

    let outcome = run_pipeline(&root, &mut log, &worker, reporter.as_ref(), cancel)?;
    let elapsed = vidshrink_core::format_duration(start_time.elapsed().as_secs_f64());

    match outcome {
        RunOutcome::Completed(stats) => {
            info!("Run finished in {}", elapsed);
            println!("{}", RunReport::new(&stats, &log));
            Ok(CompressStatus::Completed)
        }
        RunOutcome::Interrupted(stats) => {
            warn!(
                "Stopped after {} item(s) in {}; run again to resume",
                stats.processed(),
                elapsed
            );
            Ok(CompressStatus::Interrupted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use vidshrink_core::TargetCodec;

    fn args() -> CompressArgs {
        CompressArgs {
            path: PathBuf::from("/videos"),
            codec: TargetCodec::Hevc,
            crf: None,
            preset: None,
            extensions: None,
            no_verify: false,
            no_progress: true,
        }
    }

    #[test]
    fn test_build_core_config_defaults() {
        let config = build_core_config(&args()).unwrap();
        assert_eq!(config.crf, 25);
        assert!(config.verify_output);
        assert!(config.is_video_extension("mkv"));
    }

    #[test]
    fn test_build_core_config_overrides() {
        let mut a = args();
        a.codec = TargetCodec::Av1;
        a.crf = Some(40);
        a.preset = Some("8".to_string());
        a.extensions = Some(vec![" webm ".to_string(), String::new()]);
        a.no_verify = true;

        let config = build_core_config(&a).unwrap();
        assert_eq!(config.target_codec, TargetCodec::Av1);
        assert_eq!(config.crf, 40);
        assert_eq!(config.extensions, vec!["webm".to_string()]);
        assert!(!config.verify_output);
    }

    #[test]
    fn test_build_core_config_rejects_out_of_range_crf() {
        let mut a = args();
        a.crf = Some(60);
        assert!(build_core_config(&a).is_err());
    }
}
