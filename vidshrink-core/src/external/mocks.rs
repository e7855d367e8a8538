// vidshrink-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests and when the "test-mocks" feature is enabled.

use super::*;
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::cell::RefCell;
use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;

/// Mock implementation of FfmpegProcess.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    /// Events to emit when handle_events is called.
    pub events_to_emit: Rc<RefCell<Vec<FfmpegEvent>>>,
    /// Exit status to return when wait is called.
    pub exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let events = self.events_to_emit.borrow().clone();
        for event in events {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// An expected ffmpeg call and its mock result.
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub result: CoreResult<MockFfmpegProcess>,
    pub create_dummy_output: bool,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Rc<RefCell<Vec<MockFfmpegExpectation>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(
        &self,
        arg_pattern: &str,
        result: CoreResult<MockFfmpegProcess>,
        create_dummy_output: bool,
    ) {
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
            create_dummy_output,
        });
    }

    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        create_dummy_output: bool,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(events)),
            exit_status: ExitStatus::from_raw(0),
        };
        self.add_expectation(arg_pattern, Ok(process), create_dummy_output);
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, Err(error), false);
    }

    /// The exit code is encoded the way `wait(2)` reports a normal exit.
    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(events)),
            exit_status: ExitStatus::from_raw(exit_code << 8),
        };
        self.add_expectation(arg_pattern, Ok(process), false);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .as_inner()
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.borrow_mut().push(args.clone());

        let mut expectations = self.expectations.borrow_mut();
        let found_index = expectations
            .iter()
            .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));

        let Some(index) = found_index else {
            log::error!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
            panic!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
        };

        let expectation = expectations.remove(index);
        log::info!(
            "MockFfmpegSpawner: Matched expectation with pattern '{}'",
            expectation.arg_pattern
        );

        let process = expectation.result?;
        if expectation.create_dummy_output {
            match args.last() {
                Some(output) => {
                    if let Err(e) = std::fs::write(output, b"mock encoded output") {
                        log::error!("MockFfmpegSpawner failed to create dummy output {}: {}", output, e);
                    }
                }
                None => log::warn!("MockFfmpegSpawner couldn't find output path in args."),
            }
        }
        Ok(process)
    }
}

/// Mock implementation of CodecProber.
///
/// Results are keyed by path; a path without an expectation fails the probe.
#[derive(Clone, Default)]
pub struct MockProber {
    results: Rc<RefCell<HashMap<PathBuf, Result<ProbeResult, String>>>>,
    calls: Rc<RefCell<Vec<PathBuf>>>,
}

impl MockProber {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn expect_codec(&self, path: &Path, codec_name: &str) {
        self.results.borrow_mut().insert(
            path.to_path_buf(),
            Ok(ProbeResult {
                codec_name: codec_name.to_string(),
                duration_secs: Some(10.0),
            }),
        );
    }

    pub fn expect_failure(&self, path: &Path, message: &str) {
        self.results
            .borrow_mut()
            .insert(path.to_path_buf(), Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }
}

impl CodecProber for MockProber {
    fn probe(&self, path: &Path) -> CoreResult<ProbeResult> {
        self.calls.borrow_mut().push(path.to_path_buf());
        match self.results.borrow().get(path) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(CoreError::ProbeFailure(message.clone())),
            None => Err(CoreError::ProbeFailure(format!(
                "MockProber: no expectation set for {}",
                path.display()
            ))),
        }
    }
}

/// What a `MockEncoder` does when asked to encode.
#[derive(Debug, Clone)]
pub enum MockEncodeBehavior {
    /// Writes `bytes` to the output and succeeds
    Succeed { bytes: Vec<u8> },
    /// Writes `partial_bytes` to the output, then fails
    Fail { partial_bytes: Vec<u8>, message: String },
}

/// Mock implementation of Encoder that writes canned output.
#[derive(Clone)]
pub struct MockEncoder {
    behavior: MockEncodeBehavior,
    calls: Rc<RefCell<Vec<EncodeParams>>>,
}

impl MockEncoder {
    pub fn succeeding(bytes: &[u8]) -> Self {
        Self {
            behavior: MockEncodeBehavior::Succeed {
                bytes: bytes.to_vec(),
            },
            calls: Rc::default(),
        }
    }

    pub fn failing(partial_bytes: &[u8], message: &str) -> Self {
        Self {
            behavior: MockEncodeBehavior::Fail {
                partial_bytes: partial_bytes.to_vec(),
                message: message.to_string(),
            },
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> Vec<EncodeParams> {
        self.calls.borrow().clone()
    }
}

impl Encoder for MockEncoder {
    fn encode(
        &self,
        params: &EncodeParams,
        on_progress: &mut dyn FnMut(EncodeProgress),
    ) -> CoreResult<()> {
        self.calls.borrow_mut().push(params.clone());
        on_progress(EncodeProgress {
            fraction: Some(0.5),
            media_secs: 5.0,
            speed: 2.0,
        });
        match &self.behavior {
            MockEncodeBehavior::Succeed { bytes } => {
                std::fs::write(&params.output, bytes)?;
                Ok(())
            }
            MockEncodeBehavior::Fail {
                partial_bytes,
                message,
            } => {
                std::fs::write(&params.output, partial_bytes)?;
                Err(CoreError::EncodeFailure(message.clone()))
            }
        }
    }
}
