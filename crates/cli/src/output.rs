//! CLI output formatting utilities.
//!
//! Colored status lines, duration formatting, and the terminal progress
//! handler that turns orchestrator events into user-facing output.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use nbake_lib::orchestrator::{ProgressEvent, ProgressHandler};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Prints orchestrator progress to the terminal.
///
/// In JSON mode stdout is reserved for the summary, so only missing binaries
/// and kept descriptors are reported, on stderr.
pub struct TerminalHandler {
  format: OutputFormat,
}

impl TerminalHandler {
  pub fn new(format: OutputFormat) -> Self {
    Self { format }
  }
}

impl ProgressHandler for TerminalHandler {
  fn on_progress(&self, event: &ProgressEvent) {
    let json = self.format.is_json();
    match event {
      ProgressEvent::MissingBinary { message } => {
        if json {
          eprintln!("{}", message);
        } else {
          println!("{}", message);
        }
      }
      ProgressEvent::DescriptorKept { path } => {
        print_warning(&format!("Derived descriptor left in place: {}", path.display()));
      }
      _ if json => {}
      ProgressEvent::Planned { .. } => {}
      ProgressEvent::TaskStarted { task } => {
        println!(
          "{} {}",
          symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.cyan()),
          task.if_supports_color(Stream::Stdout, |s| s.bold())
        );
      }
      ProgressEvent::TaskFinished { task, duration } => {
        print_success(&format!("{} ({})", task, format_duration(*duration)));
      }
      ProgressEvent::TaskFailed { task, .. } => {
        print_error(&format!("{} failed", task));
      }
      ProgressEvent::ToolReady { path, downloaded } => {
        if *downloaded {
          print_info(&format!("Downloaded {}", path.display()));
        }
      }
      ProgressEvent::RestoreWarning { command, message } => {
        print_warning(&format!("Restore command failed: {} ({})", command, message));
      }
      ProgressEvent::TestReport { report } => {
        print_stat("Report", &report.display().to_string());
      }
      ProgressEvent::Artifact { path } => {
        print_stat("Wrote", &path.display().to_string());
      }
    }
  }
}
