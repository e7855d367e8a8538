//! Core library for resumable, crash-safe in-place video recompression.
//!
//! This crate scans a directory tree (or takes a single file), re-encodes
//! every candidate video with the target codec via ffmpeg, atomically
//! replaces the original and records each outcome in a `compression_log.json`
//! next to the root. A killed run resumes where it stopped.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vidshrink_core::external::{
//!     FfmpegEncoder, FfprobeProber, RenameReplacer, SidecarSpawner, StdFsMetadataProvider,
//! };
//! use vidshrink_core::processing::{RunOutcome, TranscodeWorker, run_pipeline};
//! use vidshrink_core::progress_reporting::LogReporter;
//! use vidshrink_core::{CompressionLog, CoreConfig, RunReport, ScanRoot};
//! use std::path::Path;
//! use std::sync::atomic::AtomicBool;
//!
//! let config = CoreConfig::default();
//! config.validate().unwrap();
//!
//! let root = ScanRoot::resolve(Path::new("/videos")).unwrap();
//! let mut log = CompressionLog::load(root.base_dir()).unwrap();
//! let worker = TranscodeWorker::new(
//!     FfprobeProber::new(),
//!     FfmpegEncoder::new(SidecarSpawner::new()),
//!     StdFsMetadataProvider,
//!     RenameReplacer,
//!     config,
//! );
//!
//! let cancel = AtomicBool::new(false);
//! match run_pipeline(&root, &mut log, &worker, &LogReporter, &cancel).unwrap() {
//!     RunOutcome::Completed(stats) => println!("{}", RunReport::new(&stats, &log)),
//!     RunOutcome::Interrupted(_) => {}
//! }
//! ```

pub mod compression_log;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod processing;
pub mod progress_reporting;
pub mod reporting;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use compression_log::{CompressionLog, EntryStatus, FailureKind, FileRecord, LogEntry};
pub use config::{CoreConfig, TargetCodec};
pub use discovery::{ScanRoot, Scanner};
pub use error::{CoreError, CoreResult};
pub use processing::{ItemOutcome, RunOutcome, RunStats, TranscodeWorker, run_pipeline};
pub use progress_reporting::{ProgressReporter, RunCounts};
pub use reporting::{RunReport, Summary};
pub use utils::{format_bytes, format_duration, format_gigabytes, parse_ffmpeg_time};
