//! Sequential execution of a task schedule.
//!
//! The orchestrator resolves the build configuration once, computes the
//! schedule from the task graph and runs each task in order, stopping at the
//! first failure. Per-run state lives in a [`RunContext`] owned by `run`, so
//! the derived descriptor guard is dropped (and the file removed) on any
//! early return.

mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::build::{self, BuildRequest};
use crate::config::{BuildConfiguration, Settings, with_configuration};
use crate::descriptor::{
  DerivedDescriptor, QualifiedNameRewrite, cleanup_derived_descriptor, derived_path, prepare_derived_descriptor,
};
use crate::git::CommitInfo;
use crate::pack::{self, PackRequest};
use crate::packages::{self, ToolStatus};
use crate::platform::{HostPlatform, Toolchain};
use crate::task::{TaskError, TaskGraph, TaskId, TaskInvocation};
use crate::test_runner::{self, ParallelMode, RunnerOptions};
use crate::version::{self, AssemblyInfo, VersionNumber};

pub use progress::{LoggingHandler, ProgressEvent, ProgressHandler};

/// Per-run overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  pub configuration: Option<String>,
  pub parallel_mode: Option<ParallelMode>,
  pub max_threads: Option<u32>,
  pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
  pub task: TaskId,
  pub duration_ms: u64,
}

/// What a run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
  pub host: String,
  pub toolchain: Toolchain,
  pub configuration: String,
  pub dry_run: bool,
  pub planned: Vec<TaskId>,
  pub completed: Vec<TaskRecord>,
  pub restore_warnings: usize,
  pub reports: Vec<PathBuf>,
  pub artifacts: Vec<PathBuf>,
}

impl RunSummary {
  pub fn total_duration(&self) -> Duration {
    Duration::from_millis(self.completed.iter().map(|r| r.duration_ms).sum())
  }
}

/// State shared by the tasks of one run.
struct RunContext {
  configuration: BuildConfiguration,
  derived: Option<DerivedDescriptor>,
  commit: Option<CommitInfo>,
}

pub struct Orchestrator {
  root: PathBuf,
  settings: Settings,
  platform: HostPlatform,
  graph: TaskGraph,
  options: RunOptions,
  handler: Arc<dyn ProgressHandler>,
}

impl Orchestrator {
  /// The platform's runtime launcher is replaced by the configured one.
  pub fn new(root: PathBuf, settings: Settings, platform: HostPlatform, options: RunOptions) -> Result<Self, TaskError> {
    let platform = platform.with_launcher(settings.toolchain.runtime_launcher.clone());
    let graph = TaskGraph::standard(&platform)?;
    Ok(Self {
      root,
      settings,
      platform,
      graph,
      options,
      handler: Arc::new(LoggingHandler),
    })
  }

  pub fn with_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
    self.handler = handler;
    self
  }

  pub fn graph(&self) -> &TaskGraph {
    &self.graph
  }

  pub fn platform(&self) -> &HostPlatform {
    &self.platform
  }

  /// The configuration for a run: at most one distinct override is allowed.
  pub fn resolve_configuration(&self, invocations: &[TaskInvocation]) -> Result<BuildConfiguration, TaskError> {
    let mut requested: Option<&str> = self.options.configuration.as_deref();
    for name in invocations.iter().filter_map(TaskInvocation::configuration) {
      match requested {
        Some(first) if first != name => {
          return Err(TaskError::ConflictingConfiguration {
            first: first.to_string(),
            second: name.to_string(),
          });
        }
        _ => requested = Some(name),
      }
    }
    Ok(self.settings.build_configuration(requested))
  }

  pub fn plan(&self, invocations: &[TaskInvocation]) -> Vec<TaskId> {
    let targets: Vec<TaskId> = invocations.iter().map(|i| i.task).collect();
    self.graph.schedule(&targets)
  }

  pub async fn run(&self, invocations: &[TaskInvocation]) -> Result<RunSummary, TaskError> {
    let configuration = self.resolve_configuration(invocations)?;
    let planned = self.plan(invocations);
    self.emit(ProgressEvent::Planned { tasks: planned.clone() });

    info!(
      host = %self.platform,
      toolchain = %self.platform.toolchain(),
      configuration = %configuration,
      tasks = planned.len(),
      "starting run"
    );

    let mut summary = RunSummary {
      host: self.platform.identifier().to_string(),
      toolchain: self.platform.toolchain(),
      configuration: configuration.name.clone(),
      dry_run: self.options.dry_run,
      planned: planned.clone(),
      completed: Vec::new(),
      restore_warnings: 0,
      reports: Vec::new(),
      artifacts: Vec::new(),
    };

    if self.options.dry_run {
      return Ok(summary);
    }

    let mut ctx = RunContext {
      configuration,
      derived: None,
      commit: None,
    };

    for task in planned {
      self.emit(ProgressEvent::TaskStarted { task });
      let started = Instant::now();

      if let Err(e) = self.execute(task, invocations, &mut ctx, &mut summary).await {
        self.emit(ProgressEvent::TaskFailed {
          task,
          error: e.to_string(),
        });
        return Err(e);
      }

      let duration = started.elapsed();
      self.emit(ProgressEvent::TaskFinished { task, duration });
      summary.completed.push(TaskRecord {
        task,
        duration_ms: duration.as_millis() as u64,
      });
    }

    if let Some(derived) = ctx.derived.take() {
      let path = derived.keep();
      self.emit(ProgressEvent::DescriptorKept { path });
    }

    Ok(summary)
  }

  fn emit(&self, event: ProgressEvent) {
    self.handler.on_progress(&event);
  }

  async fn execute(
    &self,
    task: TaskId,
    invocations: &[TaskInvocation],
    ctx: &mut RunContext,
    summary: &mut RunSummary,
  ) -> Result<(), TaskError> {
    let root = self.root.as_path();
    let settings = &self.settings;

    match task {
      TaskId::NugetDownload => {
        let path = root.join(&settings.nuget.path);
        let status =
          packages::ensure_tool_present(&path, &settings.nuget.download_url, settings.nuget.sha256.as_deref()).await?;
        self.emit(ProgressEvent::ToolReady {
          path,
          downloaded: matches!(status, ToolStatus::Downloaded { .. }),
        });
      }

      TaskId::NugetRestore => {
        let commands = packages::restore_commands(root, settings);
        let report = packages::restore(&commands, root, &self.platform).await;
        for (command, warning) in report.warnings() {
          self.emit(ProgressEvent::RestoreWarning {
            command: command.to_string(),
            message: warning.reason(),
          });
        }
        summary.restore_warnings += report.warning_count();
      }

      TaskId::NugetCheck => {
        let report = packages::validate(root, &settings.nuget.descriptor_pattern)?;
        for missing in &report.missing {
          self.emit(ProgressEvent::MissingBinary {
            message: missing.message(),
          });
        }
        if !report.is_complete() {
          return Err(TaskError::MissingPackages { count: report.count() });
        }
      }

      TaskId::BuildPrepare => {
        let source = settings.variant_source_descriptor(root);
        let derived = prepare_derived_descriptor(&source, &settings.variant.suffix)?;
        self.emit(ProgressEvent::Artifact {
          path: derived.path().to_path_buf(),
        });
        ctx.derived = Some(derived);
      }

      TaskId::BuildCleanup => {
        let generated = settings.variant_generated_config(root, &ctx.configuration.name);
        let rewrite = self.qualified_name_rewrite();
        match ctx.derived.take() {
          Some(derived) => derived.cleanup(&generated, &rewrite)?,
          None => {
            let derived = derived_path(&settings.variant_source_descriptor(root), &settings.variant.suffix);
            cleanup_derived_descriptor(&derived, &generated, &rewrite)?;
          }
        }
      }

      TaskId::BuildMs => self.compile(Toolchain::Native, settings.solution.clone(), &ctx.configuration).await?,
      TaskId::BuildMono => {
        self
          .compile(Toolchain::CrossPlatform, settings.solution.clone(), &ctx.configuration)
          .await?
      }
      TaskId::BuildMsTestProject => {
        let config = ctx.configuration.for_target(settings.variant.platform_target);
        self.compile(Toolchain::Native, self.variant_project(), &config).await?
      }
      TaskId::BuildMonoTestProject => {
        let config = ctx.configuration.for_target(settings.variant.platform_target);
        self.compile(Toolchain::CrossPlatform, self.variant_project(), &config).await?
      }

      TaskId::TestsUnit => {
        let reports = test_runner::run_all(
          root,
          &self.platform,
          &settings.tests,
          &ctx.configuration.name,
          self.runner_options(),
        )
        .await?;
        for report in &reports {
          self.emit(ProgressEvent::TestReport { report: report.clone() });
        }
        summary.reports.extend(reports);
      }

      TaskId::TestsXunit => {
        let invocation = invocations
          .iter()
          .find(|i| i.task == TaskId::TestsXunit)
          .cloned()
          .unwrap_or_else(|| TaskInvocation::new(TaskId::TestsXunit));
        let report = self.run_single_assembly(&invocation).await?;
        self.emit(ProgressEvent::TestReport { report: report.clone() });
        summary.reports.push(report);
      }

      TaskId::Version => {
        let version_file = root.join(&settings.product.version_file);
        let version = version::increment_build(&version_file)?;
        let commit = ctx.commit.get_or_insert_with(|| CommitInfo::discover(root));

        let info = AssemblyInfo {
          title: settings.product.title.clone(),
          description: commit.hash.clone(),
          company: settings.product.company.clone(),
          product: settings.product_name(),
          copyright: settings.product.copyright.clone(),
          version,
        };
        let path = root.join(&settings.product.assembly_info);
        version::write_assembly_info(&path, &info)?;
        self.emit(ProgressEvent::Artifact { path: path.clone() });
        summary.artifacts.push(path);
      }

      TaskId::Pack => {
        let version = VersionNumber::load(&root.join(&settings.product.version_file))?;
        let commit = ctx.commit.get_or_insert_with(|| CommitInfo::discover(root));
        let name = pack::archive_name(&settings.product_name(), &version.to_string(), &commit.short_hash);

        let request = PackRequest {
          directories: settings
            .pack
            .directories
            .iter()
            .map(|d| root.join(with_configuration(d, &ctx.configuration.name)))
            .collect(),
          extra_files: settings.pack.extra_files.iter().map(|f| root.join(f)).collect(),
          exclusions: settings.pack.exclusions.clone(),
          archive: pack::archive_path(root, &settings.pack.output_dir, &name),
        };
        let result = pack::pack(&request)?;
        self.emit(ProgressEvent::Artifact {
          path: result.archive.clone(),
        });
        summary.artifacts.push(result.archive);
      }

      TaskId::NugetAll | TaskId::BuildMsFull | TaskId::BuildMonoFull | TaskId::BuildChoose | TaskId::Default => {
        debug!(task = %task, "aggregate task complete");
      }
    }

    Ok(())
  }

  async fn compile(&self, toolchain: Toolchain, project: PathBuf, config: &BuildConfiguration) -> Result<(), TaskError> {
    let request = BuildRequest::new(toolchain, project, config).with_verbosity(&self.settings.toolchain.verbosity);
    build::build(&self.root, &self.platform, &self.settings.toolchain, &request).await?;
    Ok(())
  }

  /// The derived descriptor, relative to the root.
  fn variant_project(&self) -> PathBuf {
    derived_path(
      &self.settings.variant_source_descriptor(Path::new("")),
      &self.settings.variant.suffix,
    )
  }

  fn qualified_name_rewrite(&self) -> QualifiedNameRewrite {
    let variant = &self.settings.variant;
    QualifiedNameRewrite {
      type_name: variant.config_section.clone(),
      old_assembly: variant.project.clone(),
      new_assembly: format!("{}.{}", variant.project, variant.suffix),
    }
  }

  fn runner_options(&self) -> RunnerOptions {
    let mut options = RunnerOptions::from(&self.settings.tests);
    if let Some(mode) = self.options.parallel_mode {
      options.parallel_mode = mode;
    }
    if let Some(threads) = self.options.max_threads {
      options.max_threads = threads;
    }
    options
  }

  async fn run_single_assembly(&self, invocation: &TaskInvocation) -> Result<PathBuf, TaskError> {
    let task = invocation.task;
    let command = invocation.required(0)?;
    let assembly = invocation.required(1)?;
    let output_file = invocation.required(2)?;

    let mut options = self.runner_options();
    if let Some(mode) = invocation.arg(3) {
      options.parallel_mode = mode.parse().map_err(|_| TaskError::InvalidArgument {
        task,
        name: "parallel_mode",
        value: mode.to_string(),
      })?;
    }
    if let Some(threads) = invocation.arg(4) {
      options.max_threads = threads.parse().map_err(|_| TaskError::InvalidArgument {
        task,
        name: "max_threads",
        value: threads.to_string(),
      })?;
    }

    let report = test_runner::run_single(
      &self.root,
      &self.platform,
      Path::new(command),
      Path::new(assembly),
      &self.root.join(output_file),
      options,
    )
    .await?;
    Ok(report)
  }
}
