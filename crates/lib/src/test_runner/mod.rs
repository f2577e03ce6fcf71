//! Test assembly discovery and execution through the console runner.
//!
//! Assemblies run one at a time; each writes an XML report into the results
//! directory. The first failing assembly stops the run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{TestSettings, with_configuration};
use crate::platform::HostPlatform;
use crate::process::{self, Invocation, OutputMode, ProcessError};
use crate::util::walk::{RelativeGlob, find_files, is_hidden};

#[derive(Debug, Error)]
pub enum TestRunError {
  #[error("invalid test assembly pattern '{pattern}': {source}")]
  Pattern {
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  #[error("failed to scan for test assemblies: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("failed to prepare results directory {}: {source}", path.display())]
  Results {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("tests in {} failed with exit code {code:?}", assembly.display())]
  Failed { assembly: PathBuf, code: Option<i32> },

  #[error("failed to start test runner: {0}")]
  Spawn(#[source] ProcessError),

  #[error("unknown parallel mode '{0}' (expected none, collections, assemblies or all)")]
  ParallelMode(String),
}

/// How the runner parallelizes work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallelMode {
  None,
  #[default]
  Collections,
  Assemblies,
  All,
}

impl ParallelMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Collections => "collections",
      Self::Assemblies => "assemblies",
      Self::All => "all",
    }
  }
}

impl fmt::Display for ParallelMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for ParallelMode {
  type Err = TestRunError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "none" => Ok(Self::None),
      "collections" => Ok(Self::Collections),
      "assemblies" => Ok(Self::Assemblies),
      "all" => Ok(Self::All),
      _ => Err(TestRunError::ParallelMode(s.to_string())),
    }
  }
}

/// Runner options shared by every assembly of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunnerOptions {
  pub parallel_mode: ParallelMode,
  /// 0 leaves the choice to the runner.
  pub max_threads: u32,
}

impl From<&TestSettings> for RunnerOptions {
  fn from(settings: &TestSettings) -> Self {
    Self {
      parallel_mode: settings.parallel_mode,
      max_threads: settings.max_threads,
    }
  }
}

/// A test assembly and the report it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestAssemblyRef {
  pub assembly: PathBuf,
  pub report: PathBuf,
}

impl TestAssemblyRef {
  /// Report named after the assembly: `<results_dir>/<file name>.xml`.
  pub fn new(assembly: PathBuf, results_dir: &Path) -> Self {
    let name = assembly
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    Self {
      report: results_dir.join(format!("{}.xml", name)),
      assembly,
    }
  }
}

/// Current assemblies (minus exclusions) followed by legacy ones, each group sorted.
pub fn discover(root: &Path, settings: &TestSettings, configuration: &str) -> Result<Vec<TestAssemblyRef>, TestRunError> {
  let results_dir = root.join(&settings.results_dir);

  let compile = |pattern: &str| {
    RelativeGlob::new(pattern).map_err(|source| TestRunError::Pattern {
      pattern: pattern.to_string(),
      source,
    })
  };

  let current = compile(&with_configuration(&settings.pattern, configuration))?;
  let legacy = compile(&with_configuration(&settings.legacy_pattern, configuration))?;
  let excluded = settings
    .exclude
    .iter()
    .map(|p| compile(p))
    .collect::<Result<Vec<_>, _>>()?;

  let relative = |path: &Path| path.strip_prefix(root).unwrap_or(path).to_path_buf();

  let mut assemblies: Vec<PathBuf> = find_files(root, &current, is_hidden)?
    .into_iter()
    .filter(|path| !excluded.iter().any(|glob| glob.matches(&relative(path))))
    .collect();
  let legacy_assemblies = find_files(root, &legacy, is_hidden)?;

  for path in legacy_assemblies {
    if !assemblies.contains(&path) {
      assemblies.push(path);
    }
  }

  debug!(count = assemblies.len(), "discovered test assemblies");
  Ok(
    assemblies
      .into_iter()
      .map(|a| TestAssemblyRef::new(a, &results_dir))
      .collect(),
  )
}

/// `<runner> <assembly> -xml <report> -parallel <mode> -maxthreads <n>`, runtime-wrapped.
pub fn invocation(
  platform: &HostPlatform,
  runner: &Path,
  assembly: &TestAssemblyRef,
  options: RunnerOptions,
) -> Invocation {
  Invocation::new(runner.to_string_lossy())
    .arg(assembly.assembly.to_string_lossy())
    .arg("-xml")
    .arg(assembly.report.to_string_lossy())
    .arg("-parallel")
    .arg(options.parallel_mode.as_str())
    .arg("-maxthreads")
    .arg(options.max_threads.to_string())
    .wrap_runtime(platform)
}

/// Create the results directory and remove stale `*.xml` / `*.html` reports from it.
pub fn prepare_results_dir(results_dir: &Path) -> Result<usize, TestRunError> {
  let io_err = |source| TestRunError::Results {
    path: results_dir.to_path_buf(),
    source,
  };

  std::fs::create_dir_all(results_dir).map_err(io_err)?;

  let mut removed = 0;
  for entry in std::fs::read_dir(results_dir).map_err(io_err)? {
    let path = entry.map_err(io_err)?.path();
    let stale = path.is_file()
      && path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml") || e.eq_ignore_ascii_case("html"));
    if stale {
      std::fs::remove_file(&path).map_err(io_err)?;
      removed += 1;
    }
  }

  if removed > 0 {
    debug!(removed, dir = %results_dir.display(), "removed stale reports");
  }
  Ok(removed)
}

/// Run every assembly in order. Returns the report paths.
pub async fn run_all(
  root: &Path,
  platform: &HostPlatform,
  settings: &TestSettings,
  configuration: &str,
  options: RunnerOptions,
) -> Result<Vec<PathBuf>, TestRunError> {
  prepare_results_dir(&root.join(&settings.results_dir))?;

  let runner = root.join(with_configuration(&settings.runner, configuration));
  let assemblies = discover(root, settings, configuration)?;
  info!(count = assemblies.len(), configuration = %configuration, "running tests");

  let mut reports = Vec::with_capacity(assemblies.len());
  for assembly in &assemblies {
    info!(assembly = %assembly.assembly.display(), "processing");
    run_assembly(root, &invocation(platform, &runner, assembly, options), &assembly.assembly).await?;
    reports.push(assembly.report.clone());
  }
  Ok(reports)
}

/// Run one assembly with an explicit runner; the report is `<output_file>.xml`.
pub async fn run_single(
  root: &Path,
  platform: &HostPlatform,
  command: &Path,
  assembly: &Path,
  output_file: &Path,
  options: RunnerOptions,
) -> Result<PathBuf, TestRunError> {
  let mut report = output_file.as_os_str().to_owned();
  report.push(".xml");
  let target = TestAssemblyRef {
    assembly: assembly.to_path_buf(),
    report: PathBuf::from(report),
  };

  run_assembly(root, &invocation(platform, &root.join(command), &target, options), assembly).await?;
  Ok(target.report)
}

async fn run_assembly(root: &Path, inv: &Invocation, assembly: &Path) -> Result<(), TestRunError> {
  let output = process::execute(inv, root, OutputMode::Inherit)
    .await
    .map_err(TestRunError::Spawn)?;
  if !output.success() {
    return Err(TestRunError::Failed {
      assembly: assembly.to_path_buf(),
      code: output.code,
    });
  }
  Ok(())
}
