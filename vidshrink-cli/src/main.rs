// ============================================================================
// vidshrink-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: vidshrink Command-Line Application
//
// Parses arguments, initializes logging, installs the Ctrl+C handler and runs
// the compression pass.
//
// Exit codes:
// - 0: the scan was fully consumed (per-file errors are listed in the report)
// - 1: a fatal error stopped the run
// - 130: interrupted by Ctrl+C
//
// AI-ASSISTANT-INFO: Entry point for the vidshrink CLI

// ---- Internal crate imports ----
use vidshrink_cli::config::{EXIT_FAILURE, EXIT_INTERRUPTED};
use vidshrink_cli::error::format_fatal;
use vidshrink_cli::logging::{init_logging, level_override, stderr_supports_color};
use vidshrink_cli::progress::SharedBar;
use vidshrink_cli::{Cli, CompressStatus, run_compress};
use vidshrink_core::external::ChildTracker;

// ---- External crate imports ----
use clap::Parser;
use owo_colors::OwoColorize;

// ---- Standard library imports ----
use std::io::IsTerminal;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() {
    let cli = Cli::parse();
    let color = stderr_supports_color();
    let bar = SharedBar::default();
    init_logging(level_override(cli.verbose, cli.quiet), color, bar.clone());

    // First Ctrl+C: finish the current file, then stop. Second: stop the
    // encode's process group and exit now.
    let cancel = Arc::new(AtomicBool::new(false));
    let encoder_child = ChildTracker::new();
    let handler_flag = Arc::clone(&cancel);
    let handler_child = encoder_child.clone();
    let handler_bar = bar.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            if handler_child.terminate() {
                eprintln!("\nStopped ffmpeg; its partial output is discarded on the next run");
            }
            process::exit(EXIT_INTERRUPTED);
        }
        let msg = "Received Ctrl+C, finishing current file (press again to abort)...";
        handler_bar.suspend(|| {
            if color {
                eprintln!("{}", msg.yellow().bold());
            } else {
                eprintln!("{msg}");
            }
        });
    }) {
        log::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let show_progress = !cli.compress.no_progress && std::io::stderr().is_terminal();
    let progress = show_progress.then_some(&bar);

    match run_compress(&cli.compress, &cancel, &encoder_child, progress) {
        Ok(CompressStatus::Completed) => {}
        Ok(CompressStatus::Interrupted) => process::exit(EXIT_INTERRUPTED),
        Err(e) => {
            eprintln!("{}", format_fatal(&e, color));
            process::exit(EXIT_FAILURE);
        }
    }
}
