//! Implementation of the default `nbake [TASK]...` command.
//!
//! Loads `nbake.toml`, parses task invocations and hands them to the
//! orchestrator, printing a summary once the run finishes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use nbake_lib::config::Settings;
use nbake_lib::consts::CONFIG_FILENAME;
use nbake_lib::orchestrator::{Orchestrator, RunOptions, RunSummary};
use nbake_lib::platform::HostPlatform;
use nbake_lib::task::TaskInvocation;
use nbake_lib::test_runner::ParallelMode;

use crate::output::{
  OutputFormat, TerminalHandler, format_duration, print_info, print_json, print_stat, print_success, print_warning,
  symbols,
};

pub struct RunArgs {
  pub tasks: Vec<String>,
  pub root: PathBuf,
  pub config: Option<PathBuf>,
  pub configuration: Option<String>,
  pub parallel_mode: Option<ParallelMode>,
  pub max_threads: Option<u32>,
  pub dry_run: bool,
  pub output: OutputFormat,
}

pub fn cmd_run(args: RunArgs) -> Result<()> {
  let root = dunce::canonicalize(&args.root)
    .with_context(|| format!("Project root not found: {}", args.root.display()))?;

  let config_path = args.config.unwrap_or_else(|| root.join(CONFIG_FILENAME));
  let settings = Settings::load(&config_path).context("Failed to load configuration")?;

  let invocations = args
    .tasks
    .iter()
    .map(|t| TaskInvocation::parse(t))
    .collect::<Result<Vec<_>, _>>()?;
  debug!(root = %root.display(), tasks = ?args.tasks, "parsed invocations");

  let options = RunOptions {
    configuration: args.configuration,
    parallel_mode: args.parallel_mode,
    max_threads: args.max_threads,
    dry_run: args.dry_run,
  };

  let orchestrator = Orchestrator::new(root, settings, HostPlatform::detect(), options)?
    .with_handler(Arc::new(TerminalHandler::new(args.output)));

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let summary = rt.block_on(orchestrator.run(&invocations)).context("Run failed")?;

  if args.output.is_json() {
    print_json(&summary)?;
  } else {
    print_summary(&summary);
  }

  Ok(())
}

fn print_summary(summary: &RunSummary) {
  if summary.dry_run {
    print_info(&format!(
      "Would run {} task(s) on {} ({}, {})",
      summary.planned.len(),
      summary.host,
      summary.toolchain,
      summary.configuration
    ));
    for task in &summary.planned {
      println!("  {} {}", symbols::ARROW, task);
    }
    return;
  }

  println!();
  print_success(&format!(
    "Completed {} task(s) in {}",
    summary.completed.len(),
    format_duration(summary.total_duration())
  ));
  print_stat("Host", &format!("{} ({})", summary.host, summary.toolchain));
  print_stat("Configuration", &summary.configuration);

  if !summary.reports.is_empty() {
    print_stat("Test reports", &summary.reports.len().to_string());
  }
  for artifact in &summary.artifacts {
    print_stat("Artifact", &artifact.display().to_string());
  }
  if summary.restore_warnings > 0 {
    print_warning(&format!(
      "{} restore command(s) did not succeed; run with -v for details",
      summary.restore_warnings
    ));
  }
}
