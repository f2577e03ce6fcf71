mod cmd;
mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nbake_lib::test_runner::ParallelMode;

use crate::cmd::RunArgs;
use crate::output::{OutputFormat, print_error};

/// nbake - build orchestration for .NET-style solutions
#[derive(Parser)]
#[command(name = "nbake")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Tasks to run, optionally with arguments (e.g. `build:choose[Debug]`)
  #[arg(value_name = "TASK", default_value = "default")]
  tasks: Vec<String>,

  /// Project root
  #[arg(short = 'C', long, default_value = ".")]
  root: PathBuf,

  /// Config file (default: nbake.toml in the root)
  #[arg(short = 'f', long)]
  config: Option<PathBuf>,

  /// Build configuration, overriding the config file
  #[arg(short = 'c', long)]
  configuration: Option<String>,

  /// Test runner parallelization: none, collections, assemblies or all
  #[arg(long)]
  parallel_mode: Option<ParallelMode>,

  /// Maximum test runner threads (0 = runner default)
  #[arg(long)]
  max_threads: Option<u32>,

  /// Print the schedule without executing anything
  #[arg(short = 'n', long)]
  dry_run: bool,

  /// List available tasks and exit
  #[arg(short = 'T', long = "tasks")]
  list_tasks: bool,

  /// Output format
  #[arg(short, long, value_enum, default_value_t)]
  output: OutputFormat,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = if cli.list_tasks {
    cmd::cmd_list(cli.output)
  } else {
    cmd::cmd_run(RunArgs {
      tasks: cli.tasks,
      root: cli.root,
      config: cli.config,
      configuration: cli.configuration,
      parallel_mode: cli.parallel_mode,
      max_threads: cli.max_threads,
      dry_run: cli.dry_run,
      output: cli.output,
    })
  };

  if let Err(e) = result {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}
