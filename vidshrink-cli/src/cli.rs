// vidshrink-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser};
use std::path::PathBuf;
use vidshrink_core::TargetCodec;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "vidshrink: resumable in-place video recompression",
    long_about = "Re-encodes every video under PATH with a more efficient codec, replacing \
                  each original only after its encode has fully succeeded. Progress is \
                  recorded in compression_log.json so an interrupted run resumes where it \
                  stopped."
)]
pub struct Cli {
    #[command(flatten)]
    pub compress: CompressArgs,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompressArgs {
    /// Video file, or directory to process recursively
    #[arg(required = true, value_name = "PATH")]
    pub path: PathBuf,

    /// Target codec (hevc or av1)
    #[arg(long, value_name = "CODEC", env = "VIDSHRINK_CODEC", default_value_t = TargetCodec::Hevc)]
    pub codec: TargetCodec,

    /// Constant rate factor (defaults to 25 for hevc, 30 for av1)
    #[arg(long, value_name = "N", env = "VIDSHRINK_CRF")]
    pub crf: Option<u8>,

    /// Encoder preset (e.g. "medium" for hevc, "8" for av1)
    #[arg(long, value_name = "NAME", env = "VIDSHRINK_PRESET")]
    pub preset: Option<String>,

    /// Comma-separated candidate file extensions
    #[arg(
        long,
        value_name = "EXT,..",
        env = "VIDSHRINK_EXTENSIONS",
        value_delimiter = ','
    )]
    pub extensions: Option<Vec<String>>,

    /// Do not re-probe encoded output before it replaces the original
    #[arg(long)]
    pub no_verify: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["vidshrink", "/videos"]).unwrap();
        assert_eq!(cli.compress.path, PathBuf::from("/videos"));
        assert!(!cli.verbose);
        assert!(!cli.compress.no_verify);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "vidshrink",
            "--codec",
            "av1",
            "--crf",
            "32",
            "--preset",
            "6",
            "--extensions",
            "mkv,webm",
            "--no-verify",
            "--no-progress",
            "-q",
            "clip.mkv",
        ])
        .unwrap();
        assert_eq!(cli.compress.codec, TargetCodec::Av1);
        assert_eq!(cli.compress.crf, Some(32));
        assert_eq!(cli.compress.preset.as_deref(), Some("6"));
        assert_eq!(
            cli.compress.extensions,
            Some(vec!["mkv".to_string(), "webm".to_string()])
        );
        assert!(cli.compress.no_verify);
        assert!(cli.compress.no_progress);
        assert!(cli.quiet);
    }

    #[test]
    fn test_rejects_unknown_codec() {
        assert!(Cli::try_parse_from(["vidshrink", "--codec", "vp9", "/videos"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["vidshrink", "-v", "-q", "/videos"]).is_err());
    }
}
