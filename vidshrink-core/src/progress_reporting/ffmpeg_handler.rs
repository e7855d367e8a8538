//! `FFmpeg` progress handler
//!
//! Translates `FfmpegEvent`s from a running encode into `EncodeProgress`
//! samples, routes encoder log lines to the `ffmpeg_log` target and keeps a
//! short tail of error output for failure messages.

use crate::external::EncodeProgress;
use crate::utils::{format_duration, parse_ffmpeg_time};
use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress, LogLevel as FfmpegLogLevel};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Error lines kept for `EncodeFailure` messages.
const STDERR_TAIL_LINES: usize = 8;

/// Handler for `FFmpeg` events of a single encode
pub struct FfmpegProgressHandler {
    duration: Option<f64>,
    last_log_time: Instant,
    last_logged_percent_threshold: i32,
    stderr_tail: VecDeque<String>,
}

impl FfmpegProgressHandler {
    /// Creates a handler for an input of the given duration in seconds
    #[must_use]
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
            last_log_time: Instant::now(),
            last_logged_percent_threshold: -1,
            stderr_tail: VecDeque::with_capacity(STDERR_TAIL_LINES),
        }
    }

    /// Handles an `FFmpeg` event, returning a progress sample for progress events
    pub fn handle_event(&mut self, event: FfmpegEvent) -> Option<EncodeProgress> {
        match event {
            FfmpegEvent::Progress(progress) => Some(self.handle_progress(&progress)),
            FfmpegEvent::Log(level, message) => {
                self.handle_log(&level, &message);
                None
            }
            FfmpegEvent::Error(error) => {
                log::debug!(target: "ffmpeg_log", "{error}");
                self.push_tail(error);
                None
            }
            _ => None,
        }
    }

    /// The most recent error lines, joined with " | "
    #[must_use]
    pub fn stderr_tail(&self) -> String {
        self.stderr_tail
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn handle_progress(&mut self, progress: &FfmpegProgress) -> EncodeProgress {
        let media_secs = parse_ffmpeg_time(&progress.time).unwrap_or(0.0);
        let sample = progress_sample(media_secs, progress.speed, self.duration);
        if let Some(fraction) = sample.fraction {
            self.log_milestone(f64::from(fraction) * 100.0, media_secs, progress.speed);
        }
        sample
    }

    fn handle_log(&mut self, level: &FfmpegLogLevel, message: &str) {
        let log_level = map_ffmpeg_log_level(level);
        if log_level == log::Level::Info {
            log::debug!(target: "ffmpeg_log", "{message}");
        } else {
            log::log!(target: "ffmpeg_log", log_level, "{message}");
        }
        if log_level == log::Level::Error {
            self.push_tail(message.to_string());
        }
    }

    fn push_tail(&mut self, line: String) {
        let line = line.trim().to_string();
        if line.is_empty() {
            return;
        }
        if self.stderr_tail.len() == STDERR_TAIL_LINES {
            self.stderr_tail.pop_front();
        }
        self.stderr_tail.push_back(line);
    }

    /// Logs every 10% and at least every five minutes, so runs without a
    /// progress bar still leave a trace
    fn log_milestone(&mut self, percent: f64, media_secs: f64, speed: f32) {
        let current_threshold = (percent as i32 / 10) * 10;
        let should_log = current_threshold > self.last_logged_percent_threshold
            || self.last_log_time.elapsed() >= Duration::from_secs(300);

        if should_log {
            log::info!(
                target: "vidshrink::progress",
                "Encoding progress: {:.1}% complete | Time: {} / {} | Speed: {:.2}x | ETA: {}",
                percent,
                format_duration(media_secs),
                format_duration(self.duration.unwrap_or(0.0)),
                speed,
                format_duration(eta_seconds(media_secs, speed, self.duration))
            );
            self.last_log_time = Instant::now();
            self.last_logged_percent_threshold = current_threshold;
        }
    }
}

/// Builds a progress sample; the fraction is clamped to `0.0..=1.0`.
#[must_use]
pub fn progress_sample(media_secs: f64, speed: f32, duration: Option<f64>) -> EncodeProgress {
    let fraction = duration
        .filter(|d| *d > 0.0)
        .map(|d| (media_secs / d).clamp(0.0, 1.0) as f32);
    EncodeProgress {
        fraction,
        media_secs,
        speed,
    }
}

/// Seconds of wall time left, or 0 when it cannot be estimated
#[must_use]
pub fn eta_seconds(media_secs: f64, speed: f32, duration: Option<f64>) -> f64 {
    match duration {
        Some(total) if speed > 0.01 && total > media_secs => {
            (total - media_secs) / f64::from(speed)
        }
        _ => 0.0,
    }
}

/// Maps `FFmpeg` log level to Rust log level
fn map_ffmpeg_log_level(level: &FfmpegLogLevel) -> log::Level {
    match level {
        FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => log::Level::Error,
        FfmpegLogLevel::Warning => log::Level::Warn,
        FfmpegLogLevel::Info => log::Level::Info,
        _ => log::Level::Trace,
    }
}
