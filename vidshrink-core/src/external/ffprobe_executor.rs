//! FFprobe integration for codec detection.
//!
//! The worker only needs two facts about a candidate: the codec of its primary
//! video stream (to decide `skipped`) and its duration (to turn encoder
//! timestamps into a progress fraction).

use crate::error::{CoreError, CoreResult};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// What a probe learned about a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// `codec_name` of the first video stream, e.g. "h264" or "hevc"
    pub codec_name: String,
    /// Container duration in seconds, when known
    pub duration_secs: Option<f64>,
}

/// Capability for detecting a file's video codec.
pub trait CodecProber {
    fn probe(&self, path: &Path) -> CoreResult<ProbeResult>;
}

/// `CodecProber` backed by the `ffprobe` crate.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProber;

impl FfprobeProber {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CodecProber for FfprobeProber {
    fn probe(&self, path: &Path) -> CoreResult<ProbeResult> {
        log::debug!("Running ffprobe (via crate) for codec on: {}", path.display());
        let metadata = ffprobe(path).map_err(|err| {
            log::error!("ffprobe failed for {}: {:?}", path.display(), err);
            map_ffprobe_error(err, path)
        })?;

        let video_stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| {
                CoreError::ProbeFailure(format!("No video stream found in {}", path.display()))
            })?;

        let codec_name = video_stream
            .codec_name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                CoreError::ProbeFailure(format!(
                    "Video stream in {} has no codec name",
                    path.display()
                ))
            })?;

        let duration_secs = metadata
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0);

        Ok(ProbeResult {
            codec_name,
            duration_secs,
        })
    }
}

fn map_ffprobe_error(err: FfProbeError, path: &Path) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => {
            CoreError::ProbeFailure(format!("could not run ffprobe on {}: {io_err}", path.display()))
        }
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            CoreError::ProbeFailure(format!(
                "ffprobe exited with {} for {}: {}",
                output.status,
                path.display(),
                stderr.trim()
            ))
        }
        FfProbeError::Deserialize(err) => CoreError::ProbeFailure(format!(
            "unreadable ffprobe output for {}: {err}",
            path.display()
        )),
        _ => CoreError::ProbeFailure(format!("unknown ffprobe error for {}: {err:?}", path.display())),
    }
}
