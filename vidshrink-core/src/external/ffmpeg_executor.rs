// ============================================================================
// vidshrink-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides abstractions for spawning and interacting with FFmpeg
// processes. The encoder builds an `FfmpegCommand`, hands it to a spawner, and
// drains the resulting process's events until it exits.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - ChildTracker: pid of the running encode, for a forced stop from a signal
//   handler

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::process::ExitStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

// --- Child Tracking ---

/// Shared slot holding the pid of the ffmpeg child currently running.
///
/// Clones share the slot, so a Ctrl+C handler can hold one while the spawner
/// fills it in.
#[derive(Debug, Clone, Default)]
pub struct ChildTracker(Arc<AtomicU32>);

impl ChildTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pid of the running child, if any.
    #[must_use]
    pub fn current(&self) -> Option<u32> {
        match self.0.load(Ordering::SeqCst) {
            0 => None,
            pid => Some(pid),
        }
    }

    pub(crate) fn set(&self, pid: u32) {
        self.0.store(pid, Ordering::SeqCst);
    }

    pub(crate) fn clear(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    /// Sends SIGTERM to the running child's process group.
    ///
    /// Returns true if a signal was delivered. Safe to call from a signal
    /// handler thread while the pipeline is waiting on the child.
    pub fn terminate(&self) -> bool {
        match self.current() {
            Some(pid) => terminate_group(pid),
            None => false,
        }
    }
}

#[cfg(unix)]
fn terminate_group(pid: u32) -> bool {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // Spawned with process_group(0), so the child's pid is its group id
    let ret = unsafe { libc::killpg(pgid, libc::SIGTERM) };
    ret == 0
}

// Without a separate group the terminal's Ctrl+C already reached the child
#[cfg(not(unix))]
fn terminate_group(_pid: u32) -> bool {
    false
}

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess {
    child: SidecarChild,
    tracker: ChildTracker,
}

impl Drop for SidecarProcess {
    fn drop(&mut self) {
        self.tracker.clear();
    }
}

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.child.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            command_failed_error(
                "ffmpeg (sidecar - get iter)",
                ExitStatus::default(), // Placeholder status
                e.to_string(),
            )
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        let status = self
            .child
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e));
        self.tracker.clear();
        status
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner {
    tracker: ChildTracker,
}

impl SidecarSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawner that publishes each child's pid into `tracker`.
    #[must_use]
    pub fn with_tracker(tracker: ChildTracker) -> Self {
        Self { tracker }
    }
}

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        // Own process group: a terminal Ctrl+C stops the run between items
        // instead of killing the encode in progress
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.as_inner_mut().process_group(0);
        }
        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))?;
        let pid = child.as_inner().id();
        log::debug!("Spawned ffmpeg (pid {})", pid);
        self.tracker.set(pid);
        Ok(SidecarProcess {
            child,
            tracker: self.tracker.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_starts_empty_and_clones_share_the_slot() {
        let tracker = ChildTracker::new();
        assert_eq!(tracker.current(), None);
        assert!(!tracker.terminate());

        let handler_side = tracker.clone();
        tracker.set(4242);
        assert_eq!(handler_side.current(), Some(4242));
        tracker.clear();
        assert_eq!(handler_side.current(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_stops_the_child_process_group() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::process::{CommandExt, ExitStatusExt};
        use std::process::Command;

        let mut child = Command::new("sleep").arg("30").process_group(0).spawn()?;
        let tracker = ChildTracker::new();
        tracker.set(child.id());

        assert!(tracker.terminate());
        let status = child.wait()?;
        assert_eq!(status.signal(), Some(libc::SIGTERM));
        Ok(())
    }
}
