//! Compiler invocation.
//!
//! Describes one compile of a solution or project and turns it into the
//! command line of the host's compiler front end. The child inherits the
//! terminal; a non-zero exit fails the build with no retry.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{BuildConfiguration, ToolchainSettings};
use crate::platform::{HostPlatform, Toolchain};
use crate::process::{self, Invocation, OutputMode, ProcessError};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("build of {} failed with exit code {code:?}", project.display())]
  Failed { project: PathBuf, code: Option<i32> },

  #[error("failed to start compiler for {}: {source}", project.display())]
  Spawn {
    project: PathBuf,
    #[source]
    source: ProcessError,
  },
}

/// Properties passed to the compiler as `/p:Name=Value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildProperties {
  pub configuration: String,
  pub platform_target: Option<String>,
  pub track_file_access: bool,
}

impl From<&BuildConfiguration> for BuildProperties {
  fn from(config: &BuildConfiguration) -> Self {
    Self {
      configuration: config.name.clone(),
      platform_target: config.platform_target.property_value().map(String::from),
      track_file_access: config.track_file_access,
    }
  }
}

impl BuildProperties {
  fn pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("Configuration", self.configuration.clone())];
    if let Some(target) = &self.platform_target {
      pairs.push(("PlatformTarget", target.clone()));
    }
    pairs.push(("TrackFileAccess", self.track_file_access.to_string()));
    pairs
  }
}

/// One compile of a solution or project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
  pub toolchain: Toolchain,
  /// Solution or project, relative to the root.
  pub project: PathBuf,
  pub targets: Vec<String>,
  pub properties: BuildProperties,
  pub verbosity: String,
}

impl BuildRequest {
  pub fn new(toolchain: Toolchain, project: impl Into<PathBuf>, config: &BuildConfiguration) -> Self {
    Self {
      toolchain,
      project: project.into(),
      targets: vec!["Build".to_string()],
      properties: config.into(),
      verbosity: "minimal".to_string(),
    }
  }

  pub fn with_verbosity(mut self, verbosity: impl Into<String>) -> Self {
    self.verbosity = verbosity.into();
    self
  }
}

/// The command line for a request on this host.
///
/// Native: `msbuild <project> /t:Build /p:Configuration=Release ... /v:minimal`.
/// Cross-platform: `xbuild <project> /target:Build /p:... /verbosity:minimal`,
/// wrapped in the runtime launcher when `wrap_cross_platform` is set.
pub fn invocation(platform: &HostPlatform, toolchain: &ToolchainSettings, request: &BuildRequest) -> Invocation {
  let project = request.project.to_string_lossy().into_owned();

  let (program, target_switch, verbosity_switch) = match request.toolchain {
    Toolchain::Native => (&toolchain.native, "t", "v"),
    Toolchain::CrossPlatform => (&toolchain.cross_platform, "target", "verbosity"),
  };

  let mut inv = Invocation::new(program).arg(project);
  if !request.targets.is_empty() {
    inv = inv.arg(platform.switch(&format!("{}:{}", target_switch, request.targets.join(";"))));
  }
  for (name, value) in request.properties.pairs() {
    inv = inv.arg(platform.switch(&format!("p:{}={}", name, value)));
  }
  if !request.verbosity.is_empty() {
    inv = inv.arg(platform.switch(&format!("{}:{}", verbosity_switch, request.verbosity)));
  }

  if request.toolchain == Toolchain::CrossPlatform && toolchain.wrap_cross_platform {
    inv = inv.wrap_runtime(platform);
  }
  inv
}

/// Run one compile in `root`, streaming its output.
pub async fn build(
  root: &Path,
  platform: &HostPlatform,
  toolchain: &ToolchainSettings,
  request: &BuildRequest,
) -> Result<(), BuildError> {
  let inv = invocation(platform, toolchain, request);
  info!(
    project = %request.project.display(),
    toolchain = %request.toolchain,
    configuration = %request.properties.configuration,
    "building"
  );

  let output = process::execute(&inv, root, OutputMode::Inherit)
    .await
    .map_err(|source| BuildError::Spawn {
      project: request.project.clone(),
      source,
    })?;

  if !output.success() {
    return Err(BuildError::Failed {
      project: request.project.clone(),
      code: output.code,
    });
  }

  info!(project = %request.project.display(), "build succeeded");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Settings;
  use crate::platform::PlatformTarget;
  use tempfile::TempDir;

  fn release() -> BuildConfiguration {
    Settings::default().build_configuration(None)
  }

  #[test]
  fn native_command_line() {
    let platform = HostPlatform::from_os_identifier("win32");
    let request = BuildRequest::new(Toolchain::Native, "xunit-NoWpa.sln", &release());

    let inv = invocation(&platform, &ToolchainSettings::default(), &request);
    assert_eq!(
      inv.command_line(),
      "msbuild xunit-NoWpa.sln /t:Build /p:Configuration=Release /p:TrackFileAccess=false /v:minimal"
    );
  }

  #[test]
  fn variant_build_sets_platform_target() {
    let platform = HostPlatform::from_os_identifier("win32");
    let config = release().for_target(PlatformTarget::X86);
    let request = BuildRequest::new(Toolchain::Native, "src/app/app.x86.csproj", &config);

    let inv = invocation(&platform, &ToolchainSettings::default(), &request);
    assert!(inv.args.contains(&"/p:PlatformTarget=x86".to_string()));
  }

  #[test]
  fn cross_platform_uses_dash_switches() {
    let platform = HostPlatform::from_os_identifier("linux");
    let request = BuildRequest::new(Toolchain::CrossPlatform, "app.sln", &release());

    let inv = invocation(&platform, &ToolchainSettings::default(), &request);
    assert_eq!(
      inv.command_line(),
      "xbuild app.sln -target:Build -p:Configuration=Release -p:TrackFileAccess=false -verbosity:minimal"
    );
  }

  #[test]
  fn cross_platform_can_be_runtime_wrapped() {
    let platform = HostPlatform::from_os_identifier("linux");
    let toolchain = ToolchainSettings {
      wrap_cross_platform: true,
      ..Default::default()
    };
    let request = BuildRequest::new(Toolchain::CrossPlatform, "app.sln", &release());

    let inv = invocation(&platform, &toolchain, &request);
    assert_eq!(inv.program, "mono");
    assert_eq!(inv.args[0], "xbuild");
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn failing_compiler_is_fatal() {
    let temp = TempDir::new().unwrap();
    let platform = HostPlatform::from_os_identifier("win32");
    let toolchain = ToolchainSettings {
      native: "false".to_string(),
      ..Default::default()
    };
    let request = BuildRequest::new(Toolchain::Native, "app.sln", &release());

    let result = build(temp.path(), &platform, &toolchain, &request).await;
    assert!(matches!(result, Err(BuildError::Failed { code: Some(1), .. })));
  }

  #[tokio::test]
  async fn missing_compiler_is_spawn_error() {
    let temp = TempDir::new().unwrap();
    let platform = HostPlatform::from_os_identifier("win32");
    let toolchain = ToolchainSettings {
      native: "nbake-definitely-not-a-compiler".to_string(),
      ..Default::default()
    };
    let request = BuildRequest::new(Toolchain::Native, "app.sln", &release());

    let result = build(temp.path(), &platform, &toolchain, &request).await;
    assert!(matches!(result, Err(BuildError::Spawn { .. })));
  }
}
