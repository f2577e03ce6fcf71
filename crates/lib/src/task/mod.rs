//! Named tasks, their prerequisites and the errors a task can fail with.

mod graph;
mod invocation;

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::build::BuildError;
use crate::config::ConfigError;
use crate::descriptor::DescriptorError;
use crate::packages::{FetchError, ValidateError};
use crate::pack::PackError;
use crate::test_runner::TestRunError;
use crate::version::VersionError;

pub use graph::TaskGraph;
pub use invocation::TaskInvocation;

/// Every task a run can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
  NugetDownload,
  NugetRestore,
  NugetCheck,
  NugetAll,
  BuildPrepare,
  BuildCleanup,
  BuildMs,
  BuildMsTestProject,
  BuildMono,
  BuildMonoTestProject,
  BuildMsFull,
  BuildMonoFull,
  BuildChoose,
  TestsUnit,
  TestsXunit,
  Version,
  Pack,
  Default,
}

impl TaskId {
  pub const ALL: [TaskId; 18] = [
    Self::NugetDownload,
    Self::NugetRestore,
    Self::NugetCheck,
    Self::NugetAll,
    Self::BuildPrepare,
    Self::BuildCleanup,
    Self::BuildMs,
    Self::BuildMsTestProject,
    Self::BuildMono,
    Self::BuildMonoTestProject,
    Self::BuildMsFull,
    Self::BuildMonoFull,
    Self::BuildChoose,
    Self::TestsUnit,
    Self::TestsXunit,
    Self::Version,
    Self::Pack,
    Self::Default,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Self::NugetDownload => "nuget:download",
      Self::NugetRestore => "nuget:restore",
      Self::NugetCheck => "nuget:check",
      Self::NugetAll => "nuget:all",
      Self::BuildPrepare => "build:prepare",
      Self::BuildCleanup => "build:cleanup",
      Self::BuildMs => "build:ms",
      Self::BuildMsTestProject => "build:ms_test_project",
      Self::BuildMono => "build:mono",
      Self::BuildMonoTestProject => "build:mono_test_project",
      Self::BuildMsFull => "build:ms_full",
      Self::BuildMonoFull => "build:mono_full",
      Self::BuildChoose => "build:choose",
      Self::TestsUnit => "tests:unit",
      Self::TestsXunit => "tests:xunit",
      Self::Version => "version",
      Self::Pack => "pack",
      Self::Default => "default",
    }
  }

  pub fn description(&self) -> &'static str {
    match self {
      Self::NugetDownload => "Downloads the NuGet binary",
      Self::NugetRestore => "Downloads missing NuGet packages",
      Self::NugetCheck => "Checks whether all NuGet binaries are in place",
      Self::NugetAll => "Downloads NuGet, restores and checks packages",
      Self::BuildPrepare => "Prepares the x86 project descriptor",
      Self::BuildCleanup => "Cleans up after the x86 build",
      Self::BuildMs => "Builds the solution with MSBuild",
      Self::BuildMsTestProject => "Builds the x86 project with MSBuild",
      Self::BuildMono => "Builds the solution with xbuild",
      Self::BuildMonoTestProject => "Builds the x86 project with xbuild",
      Self::BuildMsFull => "Full MSBuild build",
      Self::BuildMonoFull => "Full xbuild build",
      Self::BuildChoose => "Switches build logic between environments",
      Self::TestsUnit => "Runs all test assemblies",
      Self::TestsXunit => "Runs one test assembly",
      Self::Version => "Increments the file and assembly version",
      Self::Pack => "Packages the app",
      Self::Default => "Builds and runs the tests",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.name() == name)
  }

  /// Prerequisites in declared order. `build:choose` is resolved per host by the graph.
  pub fn prerequisites(&self) -> &'static [TaskId] {
    use TaskId::*;
    match self {
      NugetCheck => &[NugetRestore],
      NugetAll => &[NugetDownload, NugetRestore, NugetCheck],
      BuildMs | BuildMsTestProject | BuildMono | BuildMonoTestProject => &[NugetAll, BuildPrepare],
      BuildMsFull => &[NugetAll, BuildPrepare, BuildMs, BuildMsTestProject, BuildCleanup],
      BuildMonoFull => &[NugetAll, BuildPrepare, BuildMono, BuildMonoTestProject, BuildCleanup],
      Default => &[BuildChoose, TestsUnit],
      _ => &[],
    }
  }

  /// Whether the first task argument selects the build configuration.
  pub fn takes_configuration(&self) -> bool {
    matches!(
      self,
      Self::BuildMs
        | Self::BuildMsTestProject
        | Self::BuildMono
        | Self::BuildMonoTestProject
        | Self::BuildMsFull
        | Self::BuildMonoFull
        | Self::BuildChoose
        | Self::TestsUnit
    )
  }

  /// Argument names accepted in `name[...]`.
  pub fn parameters(&self) -> &'static [&'static str] {
    if self.takes_configuration() {
      &["config"]
    } else if *self == Self::TestsXunit {
      &["command", "assembly", "output_file", "parallel_mode", "max_threads"]
    } else {
      &[]
    }
  }
}

impl fmt::Display for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl Serialize for TaskId {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.name())
  }
}

/// Why a run stopped.
#[derive(Debug, Error)]
pub enum TaskError {
  #[error("unknown task '{0}' (use --tasks to list them)")]
  UnknownTask(String),

  #[error("invalid task invocation '{0}'")]
  InvalidInvocation(String),

  #[error("task {task} takes at most {max} arguments, got {got}")]
  TooManyArguments { task: TaskId, max: usize, got: usize },

  #[error("task {task} requires argument '{name}'")]
  MissingArgument { task: TaskId, name: &'static str },

  #[error("invalid value '{value}' for argument '{name}' of {task}")]
  InvalidArgument {
    task: TaskId,
    name: &'static str,
    value: String,
  },

  #[error("conflicting configurations requested: {first} and {second}")]
  ConflictingConfiguration { first: String, second: String },

  #[error("task graph contains a cycle")]
  CycleDetected,

  #[error("Not every NuGet package is present, {count} files missing")]
  MissingPackages { count: usize },

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Validate(#[from] ValidateError),

  #[error(transparent)]
  Descriptor(#[from] DescriptorError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  TestRun(#[from] TestRunError),

  #[error(transparent)]
  Pack(#[from] PackError),

  #[error(transparent)]
  Version(#[from] VersionError),
}
