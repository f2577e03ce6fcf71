//! Progress reporting for a run.
//!
//! The orchestrator never prints; it emits events and the caller decides how
//! they reach the user.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::task::TaskId;

/// Events emitted while a run executes
#[derive(Debug, Clone)]
pub enum ProgressEvent {
  /// The schedule was computed
  Planned { tasks: Vec<TaskId> },

  TaskStarted { task: TaskId },

  TaskFinished { task: TaskId, duration: Duration },

  TaskFailed { task: TaskId, error: String },

  /// The package manager executable was already in place or just downloaded
  ToolReady { path: PathBuf, downloaded: bool },

  /// A restore command did not succeed; the run continues
  RestoreWarning { command: String, message: String },

  /// A referenced package binary does not exist
  MissingBinary { message: String },

  /// A test assembly finished and wrote its report
  TestReport { report: PathBuf },

  /// An artifact (archive, assembly info, derived descriptor) was written
  Artifact { path: PathBuf },

  /// A derived descriptor outlives the run because cleanup never ran
  DescriptorKept { path: PathBuf },
}

/// Receives progress events from the orchestrator
pub trait ProgressHandler: Send + Sync {
  fn on_progress(&self, event: &ProgressEvent);
}

/// Handler that forwards events to tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
  fn on_progress(&self, event: &ProgressEvent) {
    match event {
      ProgressEvent::Planned { tasks } => {
        debug!(count = tasks.len(), "run planned");
      }
      ProgressEvent::TaskStarted { task } => {
        info!(task = %task, "task started");
      }
      ProgressEvent::TaskFinished { task, duration } => {
        info!(task = %task, duration_ms = duration.as_millis(), "task finished");
      }
      ProgressEvent::TaskFailed { task, error } => {
        warn!(task = %task, error = %error, "task failed");
      }
      ProgressEvent::ToolReady { path, downloaded } => {
        info!(path = %path.display(), downloaded, "package manager ready");
      }
      ProgressEvent::RestoreWarning { command, message } => {
        warn!(cmd = %command, reason = %message, "restore warning");
      }
      ProgressEvent::MissingBinary { message } => {
        warn!("{}", message);
      }
      ProgressEvent::TestReport { report } => {
        info!(report = %report.display(), "test report written");
      }
      ProgressEvent::Artifact { path } => {
        info!(path = %path.display(), "artifact written");
      }
      ProgressEvent::DescriptorKept { path } => {
        warn!(path = %path.display(), "derived descriptor left in place");
      }
    }
  }
}
