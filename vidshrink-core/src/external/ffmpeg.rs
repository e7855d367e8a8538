// ============================================================================
// vidshrink-core/src/external/ffmpeg.rs
// ============================================================================
//
// FFMPEG ENCODER: Argument Building and Encode Execution
//
// This module turns one work item into an ffmpeg invocation that re-encodes
// the primary video stream with the target codec while carrying every other
// stream, the container metadata and the chapters across unchanged. The
// output is always written to a separate path; replacing the original is the
// worker's job.
//
// KEY COMPONENTS:
// - EncodeParams: everything a single encode needs
// - ffmpeg_args / build_ffmpeg_command: argument construction
// - Encoder: capability trait consumed by the worker
// - FfmpegEncoder: Encoder implementation over an FfmpegSpawner
//
// AI-ASSISTANT-INFO: ffmpeg command construction and encode execution

// ---- Internal crate imports ----
use super::ffmpeg_executor::{FfmpegProcess, FfmpegSpawner};
use crate::config::TargetCodec;
use crate::error::{CoreError, CoreResult};
use crate::progress_reporting::ffmpeg_handler::FfmpegProgressHandler;

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;

// ---- Standard library imports ----
use std::path::{Path, PathBuf};
use std::time::Instant;

// ============================================================================
// TYPES
// ============================================================================

/// Parameters for encoding one file.
#[derive(Debug, Clone)]
pub struct EncodeParams {
    pub input: PathBuf,
    /// Where the encoder writes; never the same path as `input`
    pub output: PathBuf,
    pub target_codec: TargetCodec,
    pub crf: u8,
    pub preset: Option<String>,
    pub copy_audio: bool,
    /// Probed duration of the input, used to derive a progress fraction
    pub duration_secs: Option<f64>,
}

/// A progress sample from a running encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeProgress {
    /// Completed share of the input in `0.0..=1.0`, when the duration is known
    pub fraction: Option<f32>,
    /// Position in the input reached so far, in seconds
    pub media_secs: f64,
    /// Encoding speed relative to realtime as reported by the encoder
    pub speed: f32,
}

/// Capability for producing a target-codec copy of a file.
///
/// Returns `Ok(())` only when `params.output` holds a complete encode. Any
/// partial output left behind on failure is the caller's to discard.
pub trait Encoder {
    fn encode(
        &self,
        params: &EncodeParams,
        on_progress: &mut dyn FnMut(EncodeProgress),
    ) -> CoreResult<()>;
}

// ============================================================================
// COMMAND BUILDING
// ============================================================================

/// Returns true for containers that take the MP4 family's flags.
fn is_mp4_family(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "mp4" | "mov" | "m4v"))
        .unwrap_or(false)
}

/// Builds the ffmpeg argument list for an encode, output path last.
pub fn ffmpeg_args(params: &EncodeParams) -> Vec<String> {
    let mp4_family = is_mp4_family(&params.output);
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-i".into(),
        params.input.to_string_lossy().into_owned(),
        // Primary video stream plus every audio and subtitle stream, if any
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "0:a?".into(),
        "-map".into(),
        "0:s?".into(),
        "-map_metadata".into(),
        "0".into(),
        "-map_chapters".into(),
        "0".into(),
        "-c:v".into(),
        params.target_codec.encoder().into(),
        "-crf".into(),
        params.crf.to_string(),
    ];

    if let Some(preset) = &params.preset {
        args.push("-preset".into());
        args.push(preset.clone());
    }

    match params.target_codec {
        TargetCodec::Hevc => {
            args.push("-x265-params".into());
            args.push("log-level=error".into());
            if mp4_family {
                // Apple players refuse HEVC tagged as hev1
                args.push("-tag:v".into());
                args.push("hvc1".into());
            }
        }
        TargetCodec::Av1 => {}
    }

    args.push("-c:a".into());
    args.push(if params.copy_audio { "copy" } else { "aac" }.into());
    args.push("-c:s".into());
    args.push("copy".into());

    if mp4_family {
        args.push("-movflags".into());
        args.push("+faststart".into());
    }

    args.push("-y".into());
    args.push(params.output.to_string_lossy().into_owned());
    args
}

/// Builds the `FfmpegCommand` for an encode.
pub fn build_ffmpeg_command(params: &EncodeParams) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.args(ffmpeg_args(params));
    cmd
}

// ============================================================================
// EXECUTION
// ============================================================================

/// Runs an encode through `spawner`, forwarding progress samples.
///
/// # Errors
///
/// * `CoreError::CommandStart` - ffmpeg could not be spawned
/// * `CoreError::EncodeFailure` - ffmpeg exited non-zero or wrote nothing
pub fn run_ffmpeg_encode<S: FfmpegSpawner>(
    spawner: &S,
    params: &EncodeParams,
    on_progress: &mut dyn FnMut(EncodeProgress),
) -> CoreResult<()> {
    let input_name = params
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| params.input.display().to_string());

    let cmd = build_ffmpeg_command(params);
    log::debug!("ffmpeg command: ffmpeg {}", ffmpeg_args(params).join(" "));
    log::info!(
        "Encoding {} with {} (crf {})",
        input_name,
        params.target_codec.encoder(),
        params.crf
    );

    let start_time = Instant::now();
    let mut child = spawner.spawn(cmd)?;
    let mut handler = FfmpegProgressHandler::new(params.duration_secs);

    child.handle_events(|event| {
        if let Some(progress) = handler.handle_event(event) {
            on_progress(progress);
        }
        Ok(())
    })?;

    let status = child.wait()?;
    if !status.success() {
        let tail = handler.stderr_tail();
        log::error!("ffmpeg failed for {}: {}", input_name, status);
        return Err(CoreError::EncodeFailure(if tail.is_empty() {
            format!("ffmpeg exited with {status} for {input_name}")
        } else {
            format!("ffmpeg exited with {status} for {input_name}: {tail}")
        }));
    }

    match std::fs::metadata(&params.output) {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => {
            return Err(CoreError::EncodeFailure(format!(
                "ffmpeg produced an empty output for {input_name}"
            )));
        }
        Err(e) => {
            return Err(CoreError::EncodeFailure(format!(
                "ffmpeg produced no output for {input_name}: {e}"
            )));
        }
    }

    log::info!(
        "Finished encoding {} in {}",
        input_name,
        crate::utils::format_duration(start_time.elapsed().as_secs_f64())
    );
    Ok(())
}

/// `Encoder` backed by ffmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder<S: FfmpegSpawner> {
    spawner: S,
}

impl<S: FfmpegSpawner> FfmpegEncoder<S> {
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }
}

impl<S: FfmpegSpawner> Encoder for FfmpegEncoder<S> {
    fn encode(
        &self,
        params: &EncodeParams,
        on_progress: &mut dyn FnMut(EncodeProgress),
    ) -> CoreResult<()> {
        run_ffmpeg_encode(&self.spawner, params, on_progress)
    }
}

// ============================================================================
// TESTS
// ============================================================================
