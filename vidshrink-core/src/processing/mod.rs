//! Core processing logic and orchestration.
//!
//! The worker handles one candidate at a time and reports what happened; the
//! pipeline drives the scanner, applies the resume rules and is the only
//! writer of the compression log.

/// Per-file probe, encode and replacement
pub mod worker;

/// Sequential resumable driver
pub mod pipeline;

pub use pipeline::{
    CompressedItem, FailedItem, ResumeDecision, RunOutcome, RunStats, resume_decision,
    run_pipeline,
};
pub use worker::{ItemOutcome, TranscodeWorker, WorkItem};
