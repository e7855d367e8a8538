// ============================================================================
// vidshrink-core/src/config.rs
// ============================================================================
//
// CONFIGURATION: Core Configuration Structures and Constants
//
// This module defines the configuration used by the scanner and the worker:
// which codec everything is converted to, how the encoder is tuned, and which
// file extensions count as video candidates.
//
// USAGE:
// Instances of CoreConfig are created by consumers of the library (like
// vidshrink-cli), validated once, and then borrowed by the pipeline.

use crate::error::{CoreError, CoreResult};

use std::fmt;
use std::str::FromStr;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Name of the compression log, created in the root's own base directory.
pub const LOG_FILE_NAME: &str = "compression_log.json";

/// Default CRF for libx265. Matches the quality the tool has always used.
pub const DEFAULT_HEVC_CRF: u8 = 25;

/// Default CRF for libsvtav1.
pub const DEFAULT_AV1_CRF: u8 = 30;

/// Extensions enumerated by default (matched case-insensitively).
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "m4v"];

// ============================================================================
// TARGET CODEC
// ============================================================================

/// The single encoding format every candidate is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetCodec {
    /// H.265 / HEVC via libx265
    #[default]
    Hevc,
    /// AV1 via libsvtav1
    Av1,
}

impl TargetCodec {
    /// Codec name as reported by ffprobe's `codec_name`.
    #[must_use]
    pub fn probe_name(self) -> &'static str {
        match self {
            TargetCodec::Hevc => "hevc",
            TargetCodec::Av1 => "av1",
        }
    }

    /// ffmpeg encoder used to produce this codec.
    #[must_use]
    pub fn encoder(self) -> &'static str {
        match self {
            TargetCodec::Hevc => "libx265",
            TargetCodec::Av1 => "libsvtav1",
        }
    }

    /// Returns true if a probed codec name denotes this codec.
    #[must_use]
    pub fn matches(self, codec_name: &str) -> bool {
        let name = codec_name.trim();
        match self {
            TargetCodec::Hevc => {
                name.eq_ignore_ascii_case("hevc") || name.eq_ignore_ascii_case("h265")
            }
            TargetCodec::Av1 => name.eq_ignore_ascii_case("av1"),
        }
    }

    #[must_use]
    pub fn default_crf(self) -> u8 {
        match self {
            TargetCodec::Hevc => DEFAULT_HEVC_CRF,
            TargetCodec::Av1 => DEFAULT_AV1_CRF,
        }
    }

    /// Highest CRF the encoder accepts.
    #[must_use]
    pub fn max_crf(self) -> u8 {
        match self {
            TargetCodec::Hevc => 51,
            TargetCodec::Av1 => 63,
        }
    }
}

impl fmt::Display for TargetCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.probe_name())
    }
}

impl FromStr for TargetCodec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hevc" | "h265" | "x265" => Ok(TargetCodec::Hevc),
            "av1" => Ok(TargetCodec::Av1),
            other => Err(CoreError::Config(format!(
                "Unsupported target codec '{other}' (expected hevc or av1)"
            ))),
        }
    }
}

// ============================================================================
// CORE CONFIGURATION
// ============================================================================

/// Main configuration structure for the vidshrink-core library.
///
/// # Examples
///
/// ```rust
/// use vidshrink_core::config::{CoreConfig, TargetCodec};
///
/// let mut config = CoreConfig::for_codec(TargetCodec::Av1);
/// config.preset = Some("8".to_string());
/// config.validate().unwrap();
/// assert_eq!(config.crf, 30);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    // ---- Encoder Settings ----

    /// Codec every candidate is converted to
    pub target_codec: TargetCodec,

    /// Constant rate factor handed to the encoder (lower is better quality)
    pub crf: u8,

    /// Optional encoder preset (`-preset`)
    pub preset: Option<String>,

    /// Copy audio streams instead of re-encoding them
    pub copy_audio: bool,

    /// Re-probe the encoded output before it replaces the original
    pub verify_output: bool,

    // ---- Discovery Settings ----

    /// File extensions (without dot) that identify video candidates
    pub extensions: Vec<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::for_codec(TargetCodec::default())
    }
}

impl CoreConfig {
    /// Creates a configuration with the defaults for the given codec.
    #[must_use]
    pub fn for_codec(target_codec: TargetCodec) -> Self {
        Self {
            target_codec,
            crf: target_codec.default_crf(),
            preset: None,
            copy_audio: true,
            verify_output: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        }
    }

    /// Returns true if the extension identifies a video candidate.
    #[must_use]
    pub fn is_video_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Validates the configuration before a run starts.
    pub fn validate(&self) -> CoreResult<()> {
        if self.crf > self.target_codec.max_crf() {
            return Err(CoreError::Config(format!(
                "CRF {} is out of range for {} (0-{})",
                self.crf,
                self.target_codec,
                self.target_codec.max_crf()
            )));
        }

        if self.extensions.is_empty() {
            return Err(CoreError::Config(
                "At least one video extension is required".to_string(),
            ));
        }

        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.') || e.contains(['/', '\\']))
        {
            return Err(CoreError::Config(format!(
                "Invalid extension '{bad}' (use bare names such as mp4)"
            )));
        }

        if let Some(preset) = &self.preset {
            if preset.trim().is_empty() {
                return Err(CoreError::Config("Encoder preset must not be empty".to_string()));
            }
        }

        Ok(())
    }
}
