//! Child process execution.
//!
//! Every external tool (NuGet, the compilers, the test runner) is described by
//! an [`Invocation`] and run to completion, one at a time. Callers decide what
//! a non-zero exit means: restore treats it as a warning, build and test
//! steps treat it as fatal.

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::platform::HostPlatform;

/// Errors that can occur while running an external tool.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The program could not be started at all.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32> },
}

/// A program plus its arguments, passed to the OS without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
}

impl Invocation {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Run the program through the host's runtime launcher on unix-like hosts.
  ///
  /// The launcher becomes the program and the original program its first argument.
  pub fn wrap_runtime(self, platform: &HostPlatform) -> Self {
    if !platform.is_unix_like() {
      return self;
    }
    let mut args = Vec::with_capacity(self.args.len() + 1);
    args.push(self.program);
    args.extend(self.args);
    Self {
      program: platform.launcher().to_string(),
      args,
    }
  }

  /// The invocation as a single printable command line
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .map(quote)
      .collect::<Vec<_>>()
      .join(" ")
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.command_line())
  }
}

fn quote(part: &str) -> String {
  if part.is_empty() || part.contains(char::is_whitespace) {
    format!("\"{}\"", part)
  } else {
    part.to_string()
  }
}

/// Where a child's stdout/stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
  /// Collect output so the caller can log or inspect it.
  #[default]
  Capture,
  /// Stream output straight to this process's terminal.
  Inherit,
}

/// Exit status and (when captured) output of a finished child.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
  /// Exit code, `None` when the child was killed by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ProcessOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Run an invocation to completion in `cwd`.
///
/// The child inherits this process's environment. A non-zero exit is not an
/// error here; see [`execute_checked`].
pub async fn execute(invocation: &Invocation, cwd: &Path, mode: OutputMode) -> Result<ProcessOutput, ProcessError> {
  info!(cmd = %invocation, "executing command");

  let mut command = Command::new(&invocation.program);
  command.args(&invocation.args).current_dir(cwd).stdin(Stdio::null());

  debug!(working_dir = ?cwd, mode = ?mode, "spawning process");

  let spawn_err = |source| ProcessError::Spawn {
    program: invocation.program.clone(),
    source,
  };

  match mode {
    OutputMode::Capture => {
      let output = command.output().await.map_err(spawn_err)?;
      let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
      let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

      if !stdout.is_empty() {
        debug!(stdout = %stdout, "command stdout");
      }
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }

      Ok(ProcessOutput {
        code: output.status.code(),
        stdout,
        stderr,
      })
    }
    OutputMode::Inherit => {
      let status = command
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(spawn_err)?;

      Ok(ProcessOutput {
        code: status.code(),
        ..Default::default()
      })
    }
  }
}

/// Run an invocation and fail on a non-zero exit.
pub async fn execute_checked(
  invocation: &Invocation,
  cwd: &Path,
  mode: OutputMode,
) -> Result<ProcessOutput, ProcessError> {
  let output = execute(invocation, cwd, mode).await?;
  if !output.success() {
    return Err(ProcessError::Failed {
      cmd: invocation.command_line(),
      code: output.code,
    });
  }
  Ok(output)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{echo_msg, shell_cmd};
  use tempfile::TempDir;

  #[test]
  fn wrap_runtime_on_unix_like_host() {
    let platform = HostPlatform::from_os_identifier("linux");
    let wrapped = Invocation::new("foo.exe").arg("bar").wrap_runtime(&platform);
    assert_eq!(wrapped.program, "mono");
    assert_eq!(wrapped.args, vec!["foo.exe", "bar"]);
    assert_eq!(wrapped.command_line(), "mono foo.exe bar");
  }

  #[test]
  fn wrap_runtime_on_windows_is_identity() {
    let platform = HostPlatform::from_os_identifier("win32");
    let inv = Invocation::new("foo.exe").arg("bar");
    assert_eq!(inv.clone().wrap_runtime(&platform), inv);
  }

  #[test]
  fn command_line_quotes_whitespace() {
    let inv = Invocation::new("nuget").args(["install", "a b", ""]);
    assert_eq!(inv.command_line(), "nuget install \"a b\" \"\"");
  }

  #[tokio::test]
  async fn execute_captures_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let output = execute(&echo_msg("hello"), temp_dir.path(), OutputMode::Capture)
      .await
      .unwrap();

    assert!(output.success());
    assert_eq!(output.stdout, "hello");
  }

  #[tokio::test]
  async fn execute_reports_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let output = execute(&shell_cmd("exit 3"), temp_dir.path(), OutputMode::Capture)
      .await
      .unwrap();

    assert!(!output.success());
    assert_eq!(output.code, Some(3));
  }

  #[tokio::test]
  async fn execute_checked_fails_on_non_zero() {
    let temp_dir = TempDir::new().unwrap();
    let result = execute_checked(&shell_cmd("exit 1"), temp_dir.path(), OutputMode::Inherit).await;

    assert!(matches!(result, Err(ProcessError::Failed { code: Some(1), .. })));
  }

  #[tokio::test]
  async fn execute_missing_program_is_spawn_error() {
    let temp_dir = TempDir::new().unwrap();
    let inv = Invocation::new("nbake-definitely-not-a-real-program");
    let result = execute(&inv, temp_dir.path(), OutputMode::Capture).await;

    assert!(matches!(result, Err(ProcessError::Spawn { .. })));
  }

  #[tokio::test]
  async fn execute_runs_in_working_directory() {
    let temp_dir = TempDir::new().unwrap();
    let sub_dir = temp_dir.path().join("subdir");
    std::fs::create_dir(&sub_dir).unwrap();

    #[cfg(unix)]
    let inv = shell_cmd("touch cwd_marker");
    #[cfg(windows)]
    let inv = shell_cmd("type nul > cwd_marker");

    execute_checked(&inv, &sub_dir, OutputMode::Capture).await.unwrap();

    assert!(sub_dir.join("cwd_marker").exists());
  }
}
