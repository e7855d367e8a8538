// vidshrink-core/tests/common/mod.rs
//
// Fakes shared by the integration tests. Media "codecs" are encoded in file
// contents: a file starting with `hevc` probes as HEVC, one starting with
// `corrupt` fails the probe, anything else probes as H.264.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use vidshrink_core::compression_log::EntryStatus;
use vidshrink_core::external::{
    CodecProber, EncodeParams, EncodeProgress, Encoder, FileReplacer, ProbeResult, RenameReplacer,
    StdFsMetadataProvider,
};
use vidshrink_core::processing::TranscodeWorker;
use vidshrink_core::progress_reporting::{ProgressReporter, RunCounts};
use vidshrink_core::{CoreConfig, CoreError, CoreResult};

/// Prober that reads the codec from the file's leading bytes.
#[derive(Clone, Default)]
pub struct ContentProber;

impl CodecProber for ContentProber {
    fn probe(&self, path: &Path) -> CoreResult<ProbeResult> {
        let bytes = fs::read(path)?;
        if bytes.starts_with(b"corrupt") {
            return Err(CoreError::ProbeFailure(format!(
                "invalid data found when processing {}",
                path.display()
            )));
        }
        let codec_name = if bytes.starts_with(b"hevc") { "hevc" } else { "h264" };
        Ok(ProbeResult {
            codec_name: codec_name.to_string(),
            duration_secs: Some(10.0),
        })
    }
}

/// What the fake encoder does with an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FakeMode {
    /// Writes `hevc` plus a third of the input's size
    Shrink,
    /// Writes a partial output, then fails
    Fail,
    /// Writes a partial output, then panics, like a process killed mid-encode
    Crash,
}

/// Encoder fake that records every input it is handed.
#[derive(Clone)]
pub struct FakeEncoder {
    mode: FakeMode,
    /// Inputs that trigger `mode`; every other input is shrunk
    only: Option<String>,
    calls: Rc<RefCell<Vec<PathBuf>>>,
}

impl FakeEncoder {
    pub fn shrinking() -> Self {
        Self {
            mode: FakeMode::Shrink,
            only: None,
            calls: Rc::default(),
        }
    }

    /// Applies `mode` to inputs whose file name contains `name`.
    pub fn with_mode_for(mode: FakeMode, name: &str) -> Self {
        Self {
            mode,
            only: Some(name.to_string()),
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }

    fn mode_for(&self, input: &Path) -> FakeMode {
        match &self.only {
            Some(name) if input.to_string_lossy().contains(name.as_str()) => self.mode,
            Some(_) => FakeMode::Shrink,
            None => self.mode,
        }
    }
}

impl Encoder for FakeEncoder {
    fn encode(
        &self,
        params: &EncodeParams,
        on_progress: &mut dyn FnMut(EncodeProgress),
    ) -> CoreResult<()> {
        self.calls.borrow_mut().push(params.input.clone());
        let input_len = fs::metadata(&params.input)?.len() as usize;

        on_progress(EncodeProgress {
            fraction: Some(0.5),
            media_secs: 5.0,
            speed: 1.0,
        });

        match self.mode_for(&params.input) {
            FakeMode::Shrink => {
                let mut out = b"hevc".to_vec();
                out.resize((input_len / 3).max(4), b'.');
                fs::write(&params.output, out)?;
                Ok(())
            }
            FakeMode::Fail => {
                fs::write(&params.output, b"hevc-half")?;
                Err(CoreError::EncodeFailure("simulated encoder failure".to_string()))
            }
            FakeMode::Crash => {
                fs::write(&params.output, b"hevc-half")?;
                panic!("simulated crash mid-encode");
            }
        }
    }
}

/// Replacer whose failure can be switched on for a given file name.
#[derive(Clone, Default)]
pub struct FlakyReplacer {
    fail_for: Option<String>,
}

impl FlakyReplacer {
    pub fn failing_for(name: &str) -> Self {
        Self {
            fail_for: Some(name.to_string()),
        }
    }
}

impl FileReplacer for FlakyReplacer {
    fn replace(&self, replacement: &Path, original: &Path) -> io::Result<()> {
        if let Some(name) = &self.fail_for {
            if original.to_string_lossy().contains(name.as_str()) {
                return Err(io::Error::other("Invalid cross-device link"));
            }
        }
        RenameReplacer.replace(replacement, original)
    }
}

/// Reporter that raises the cancel flag once `after` items have finished.
pub struct CancelAfter<'a> {
    pub after: usize,
    pub cancel: &'a AtomicBool,
    pub started: RefCell<Vec<PathBuf>>,
}

impl<'a> CancelAfter<'a> {
    pub fn new(after: usize, cancel: &'a AtomicBool) -> Self {
        Self {
            after,
            cancel,
            started: RefCell::new(Vec::new()),
        }
    }
}

impl ProgressReporter for CancelAfter<'_> {
    fn item_started(&self, path: &Path, _counts: &RunCounts) {
        self.started.borrow_mut().push(path.to_path_buf());
    }

    fn encode_progress(&self, _path: &Path, _progress: &EncodeProgress) {}

    fn item_finished(&self, _path: &Path, _status: EntryStatus, counts: &RunCounts) {
        if counts.compressed + counts.skipped + counts.errored >= self.after {
            self.cancel.store(true, Ordering::SeqCst);
        }
    }

    fn run_finished(&self, _counts: &RunCounts) {}
}

pub type TestWorker<R> = TranscodeWorker<ContentProber, FakeEncoder, StdFsMetadataProvider, R>;

pub fn worker(encoder: &FakeEncoder) -> TestWorker<RenameReplacer> {
    worker_with_replacer(encoder, RenameReplacer)
}

pub fn worker_with_replacer<R: FileReplacer>(encoder: &FakeEncoder, replacer: R) -> TestWorker<R> {
    TranscodeWorker::new(
        ContentProber,
        encoder.clone(),
        StdFsMetadataProvider,
        replacer,
        CoreConfig::default(),
    )
}

/// Writes a file with `len` bytes, starting with `prefix`.
pub fn write_video(path: &Path, prefix: &[u8], len: usize) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut bytes = prefix.to_vec();
    bytes.resize(len.max(prefix.len()), b'x');
    fs::write(path, bytes)
}

/// Canonical form of a temp dir, matching what the scanner yields.
pub fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
