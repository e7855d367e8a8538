// ============================================================================
// vidshrink-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Initialization
//
// All diagnostics from vidshrink-core go through the `log` facade; this module
// installs `env_logger` as the backend. Records are written through the
// progress bar slot, which suspends a visible bar while a line is printed.
//
// USAGE:
// - RUST_LOG=info (default): one line per file plus progress milestones
// - RUST_LOG=debug or -v: decisions for every candidate and ffmpeg commands
// - RUST_LOG=ffmpeg_log=trace: raw ffmpeg output
// - -q: warnings and errors only
//
// AI-ASSISTANT-INFO: Logging initialization for the CLI

// ---- Internal crate imports ----
use crate::config::DEFAULT_LOG_FILTER;
use crate::progress::SharedBar;

// ---- External crate imports ----
use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use owo_colors::OwoColorize;

// ---- Standard library imports ----
use std::io::{self, IsTerminal, Write};

/// Level forced by -v/-q, if any. Without one RUST_LOG applies.
pub fn level_override(verbose: bool, quiet: bool) -> Option<LevelFilter> {
    if verbose {
        Some(LevelFilter::Debug)
    } else if quiet {
        Some(LevelFilter::Warn)
    } else {
        None
    }
}

/// Returns true if stderr output should carry colour.
pub fn stderr_supports_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}

/// Log sink that clears the progress bar around each write.
pub struct BarAwareWriter<W> {
    bar: SharedBar,
    inner: W,
}

impl<W: Write> BarAwareWriter<W> {
    pub fn new(bar: SharedBar, inner: W) -> Self {
        Self { bar, inner }
    }
}

impl<W: Write> Write for BarAwareWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Initializes the global logger. Records go to stderr through `bar`.
pub fn init_logging(level: Option<LevelFilter>, color: bool, bar: SharedBar) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_LOG_FILTER));
    if let Some(level) = level {
        builder.filter_level(level);
    }

    builder
        .target(Target::Pipe(Box::new(BarAwareWriter::new(bar, io::stderr()))))
        .format(move |buf, record| {
            let level_str = match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN ",
                log::Level::Info => "INFO ",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            };
            let timestamp = buf.timestamp_seconds();

            if color {
                let level_colored = match record.level() {
                    log::Level::Error => level_str.bright_red().to_string(),
                    log::Level::Warn => level_str.yellow().to_string(),
                    log::Level::Info => level_str.green().to_string(),
                    log::Level::Debug => level_str.blue().to_string(),
                    log::Level::Trace => level_str.magenta().to_string(),
                };
                writeln!(
                    buf,
                    "{} {} {}",
                    timestamp.to_string().dimmed(),
                    level_colored,
                    record.args()
                )
            } else {
                writeln!(buf, "{} {} {}", timestamp, level_str, record.args())
            }
        })
        .init();

    log::debug!("Logger initialized (override: {:?})", level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_override() {
        assert_eq!(level_override(true, false), Some(LevelFilter::Debug));
        assert_eq!(level_override(false, true), Some(LevelFilter::Warn));
        assert_eq!(level_override(false, false), None);
    }

    #[test]
    fn test_writer_passes_records_through_with_a_bar_on_screen() {
        let bar = SharedBar::default();
        bar.replace(Some(indicatif::ProgressBar::hidden()));

        let mut writer = BarAwareWriter::new(bar.clone(), Vec::new());
        writer.write_all(b"INFO  clip.mp4: compressed\n").unwrap();
        bar.replace(None);
        writer.write_all(b"INFO  done\n").unwrap();

        assert_eq!(writer.inner, b"INFO  clip.mp4: compressed\nINFO  done\n");
    }
}
