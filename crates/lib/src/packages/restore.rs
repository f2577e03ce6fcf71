//! Package restore through the NuGet executable.
//!
//! Restore never aborts the pipeline: a failing command becomes a
//! [`RestoreWarning`] and the next command still runs. Missing binaries are
//! caught afterwards by validation.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::platform::HostPlatform;
use crate::process::{self, Invocation, OutputMode};

/// Why a restore command did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RestoreWarning {
  /// The command ran and exited unsuccessfully. NuGet reports most failures on stdout.
  ExitCode {
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },
  /// The command could not be started.
  Spawn { message: String },
}

impl RestoreWarning {
  /// One-line description: the exit status plus the command's own message, if any.
  pub fn reason(&self) -> String {
    match self {
      Self::ExitCode { code, stdout, stderr } => {
        let status = match code {
          Some(code) => format!("exited with code {}", code),
          None => "terminated by signal".to_string(),
        };
        let detail = [stderr, stdout]
          .into_iter()
          .flat_map(|out| out.lines().rev())
          .map(str::trim)
          .find(|line| !line.is_empty());
        match detail {
          Some(line) => format!("{}: {}", status, line),
          None => status,
        }
      }
      Self::Spawn { message } => message.clone(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
  pub command: String,
  pub warning: Option<RestoreWarning>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
  pub outcomes: Vec<RestoreOutcome>,
}

impl RestoreReport {
  pub fn warnings(&self) -> impl Iterator<Item = (&str, &RestoreWarning)> {
    self
      .outcomes
      .iter()
      .filter_map(|o| o.warning.as_ref().map(|w| (o.command.as_str(), w)))
  }

  pub fn warning_count(&self) -> usize {
    self.warnings().count()
  }
}

/// The NuGet command sequence for a root: one `install` per declared
/// package, then a solution-wide `restore`.
///
/// Programs are not yet runtime-wrapped.
pub fn restore_commands(root: &Path, settings: &Settings) -> Vec<Invocation> {
  let nuget = root.join(&settings.nuget.path).to_string_lossy().into_owned();
  let feeds = &settings.nuget.feeds;
  let solution_dir = settings.solution_dir.to_string_lossy().into_owned();

  let mut commands: Vec<Invocation> = settings
    .nuget
    .packages
    .iter()
    .map(|package| {
      let mut inv = Invocation::new(&nuget).arg("install").arg(&package.id);
      if package.prerelease {
        inv = inv.arg("-Pre").arg("-Source").arg(feeds.prerelease());
      } else {
        inv = inv.arg("-Source").arg(feeds.joined());
      }
      inv.args([
        "-SolutionDirectory",
        solution_dir.as_str(),
        "-Verbosity",
        "quiet",
        "-ExcludeVersion",
      ])
    })
    .collect();

  commands.push(Invocation::new(&nuget).arg("restore").arg(settings.solution.to_string_lossy()).args([
    "-NonInteractive".to_string(),
    "-Source".to_string(),
    feeds.joined(),
    "-Verbosity".to_string(),
    "quiet".to_string(),
  ]));

  commands
}

/// Run each command in order, runtime-wrapped, collecting warnings.
pub async fn restore(commands: &[Invocation], root: &Path, platform: &HostPlatform) -> RestoreReport {
  let mut report = RestoreReport::default();

  for command in commands {
    let wrapped = command.clone().wrap_runtime(platform);
    let command_line = wrapped.command_line();

    let warning = match process::execute(&wrapped, root, OutputMode::Capture).await {
      Ok(output) => {
        if !output.stdout.is_empty() {
          info!(cmd = %command_line, output = %output.stdout, "restore output");
        }
        if output.success() {
          None
        } else {
          warn!(cmd = %command_line, code = ?output.code, "restore command failed");
          Some(RestoreWarning::ExitCode {
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
          })
        }
      }
      Err(e) => {
        warn!(cmd = %command_line, error = %e, "restore command could not be started");
        Some(RestoreWarning::Spawn { message: e.to_string() })
      }
    };

    report.outcomes.push(RestoreOutcome {
      command: command_line,
      warning,
    });
  }

  info!(
    commands = report.outcomes.len(),
    warnings = report.warning_count(),
    "restore finished"
  );
  report
}
