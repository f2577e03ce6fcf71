//! Typed settings read from `nbake.toml`.
//!
//! Every field has a default, so an absent file or a partial one is valid.
//! Defaults reproduce the conventions of an xunit-style solution layout.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{
  ARTIFACTS_DIR, CONFIG_PLACEHOLDER, DEFAULT_CONFIGURATION, DEFAULT_RUNTIME_LAUNCHER, DEFAULT_VARIANT_SUFFIX,
  NUGET_DOWNLOAD_URL, NUGET_PATH, PRERELEASE_FEED, PRIMARY_FEED, TEST_RESULTS_DIR, VERSION_FILENAME,
};
use crate::platform::PlatformTarget;
use crate::test_runner::ParallelMode;

use super::ConfigError;

/// Top-level settings for one project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
  /// Solution file, relative to the root.
  pub solution: PathBuf,
  /// Directory holding the projects (`src`).
  pub solution_dir: PathBuf,
  /// Configuration used when no override is given.
  pub configuration: String,
  pub track_file_access: bool,
  pub toolchain: ToolchainSettings,
  pub nuget: NugetSettings,
  pub variant: VariantSettings,
  pub tests: TestSettings,
  pub pack: PackSettings,
  pub product: ProductSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      solution: PathBuf::from("xunit-NoWpa.sln"),
      solution_dir: PathBuf::from("src"),
      configuration: DEFAULT_CONFIGURATION.to_string(),
      track_file_access: false,
      toolchain: ToolchainSettings::default(),
      nuget: NugetSettings::default(),
      variant: VariantSettings::default(),
      tests: TestSettings::default(),
      pack: PackSettings::default(),
      product: ProductSettings::default(),
    }
  }
}

impl Settings {
  /// Resolve the configuration for a run, honoring an explicit override.
  pub fn build_configuration(&self, requested: Option<&str>) -> BuildConfiguration {
    BuildConfiguration {
      name: requested.unwrap_or(&self.configuration).to_string(),
      platform_target: PlatformTarget::Default,
      track_file_access: self.track_file_access,
    }
  }

  /// The product name used for archives, falling back to the solution's file stem.
  pub fn product_name(&self) -> String {
    if !self.product.product.is_empty() {
      return self.product.product.clone();
    }
    self
      .solution
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| "product".to_string())
  }

  /// `<root>/<solution_dir>/<project>/<project>.csproj`
  pub fn variant_source_descriptor(&self, root: &Path) -> PathBuf {
    let project = &self.variant.project;
    root
      .join(&self.solution_dir)
      .join(project)
      .join(format!("{}.csproj", project))
  }

  /// `<root>/<solution_dir>/<project>/bin/<config>.<suffix>/<project>.<suffix>.exe.config`
  ///
  /// The runtime config the variant build writes next to its executable.
  pub fn variant_generated_config(&self, root: &Path, configuration: &str) -> PathBuf {
    let VariantSettings { project, suffix, .. } = &self.variant;
    root
      .join(&self.solution_dir)
      .join(project)
      .join("bin")
      .join(format!("{}.{}", configuration, suffix))
      .join(format!("{}.{}.exe.config", project, suffix))
  }
}

/// Replace `{config}` in a path template.
pub fn with_configuration(template: &str, configuration: &str) -> String {
  template.replace(CONFIG_PLACEHOLDER, configuration)
}

/// Name, target platform and file tracking flag for one run.
///
/// Selected once before any task executes and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
  pub name: String,
  pub platform_target: PlatformTarget,
  pub track_file_access: bool,
}

impl BuildConfiguration {
  /// The same configuration compiled for another platform target.
  pub fn for_target(&self, platform_target: PlatformTarget) -> Self {
    Self {
      platform_target,
      ..self.clone()
    }
  }
}

impl fmt::Display for BuildConfiguration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.platform_target.property_value() {
      Some(target) => write!(f, "{}|{}", self.name, target),
      None => write!(f, "{}", self.name),
    }
  }
}

/// External compiler front ends and how they are launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainSettings {
  pub native: String,
  pub cross_platform: String,
  /// Launcher prefixed to .NET executables on unix-like hosts.
  pub runtime_launcher: String,
  /// Run the cross-platform compiler through the runtime launcher as well.
  pub wrap_cross_platform: bool,
  pub verbosity: String,
}

impl Default for ToolchainSettings {
  fn default() -> Self {
    Self {
      native: "msbuild".to_string(),
      cross_platform: "xbuild".to_string(),
      runtime_launcher: DEFAULT_RUNTIME_LAUNCHER.to_string(),
      wrap_cross_platform: false,
      verbosity: "minimal".to_string(),
    }
  }
}

/// Ordered list of package feed URIs; never empty.
///
/// The first feed is the primary one, the second carries pre-release packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PackageFeedSet(Vec<String>);

impl PackageFeedSet {
  /// Parse the `;`-separated form NuGet accepts on its command line.
  pub fn parse(feeds: &str) -> Result<Self, ConfigError> {
    Self::try_from(
      feeds
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect::<Vec<_>>(),
    )
  }

  pub fn primary(&self) -> &str {
    &self.0[0]
  }

  /// The pre-release feed, or the primary one when only one feed is declared.
  pub fn prerelease(&self) -> &str {
    self.0.get(1).map_or(self.primary(), String::as_str)
  }

  pub fn joined(&self) -> String {
    self.0.join(";")
  }
}

impl TryFrom<Vec<String>> for PackageFeedSet {
  type Error = ConfigError;

  fn try_from(feeds: Vec<String>) -> Result<Self, Self::Error> {
    if feeds.is_empty() {
      return Err(ConfigError::EmptyFeedSet);
    }
    Ok(Self(feeds))
  }
}

impl From<PackageFeedSet> for Vec<String> {
  fn from(feeds: PackageFeedSet) -> Self {
    feeds.0
  }
}

impl Default for PackageFeedSet {
  fn default() -> Self {
    Self(vec![PRIMARY_FEED.to_string(), PRERELEASE_FEED.to_string()])
  }
}

/// A package installed explicitly before the solution restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSpec {
  pub id: String,
  /// Pre-release packages are installed from the pre-release feed only.
  #[serde(default)]
  pub prerelease: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NugetSettings {
  /// Where the NuGet executable lives, relative to the root.
  pub path: PathBuf,
  pub download_url: String,
  /// Expected SHA-256 of the downloaded executable, if known.
  pub sha256: Option<String>,
  pub feeds: PackageFeedSet,
  pub packages: Vec<PackageSpec>,
  /// Glob (relative to the root) selecting descriptors to validate.
  pub descriptor_pattern: String,
}

impl Default for NugetSettings {
  fn default() -> Self {
    Self {
      path: PathBuf::from(NUGET_PATH),
      download_url: NUGET_DOWNLOAD_URL.to_string(),
      sha256: None,
      feeds: PackageFeedSet::default(),
      packages: vec![
        PackageSpec {
          id: "xunit.buildtasks".to_string(),
          prerelease: false,
        },
        PackageSpec {
          id: "githublink".to_string(),
          prerelease: true,
        },
      ],
      descriptor_pattern: "**/*.csproj".to_string(),
    }
  }
}

/// The project that gets a second, x86-targeted build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantSettings {
  pub project: String,
  pub suffix: String,
  pub platform_target: PlatformTarget,
  /// Type whose assembly-qualified name is rewritten in the generated config.
  pub config_section: String,
}

impl Default for VariantSettings {
  fn default() -> Self {
    Self {
      project: "xunit.console".to_string(),
      suffix: DEFAULT_VARIANT_SUFFIX.to_string(),
      platform_target: PlatformTarget::X86,
      config_section: "Xunit.ConsoleClient.XunitConsoleConfigurationSection".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestSettings {
  /// Test runner executable (path template).
  pub runner: String,
  /// Glob for current test assemblies (path template).
  pub pattern: String,
  /// Globs removed from `pattern` matches.
  pub exclude: Vec<String>,
  /// Glob for assemblies built against the legacy (v1) framework, run after the rest.
  pub legacy_pattern: String,
  pub results_dir: PathBuf,
  pub parallel_mode: ParallelMode,
  /// Upper bound on runner threads; 0 leaves the choice to the runner.
  pub max_threads: u32,
}

impl Default for TestSettings {
  fn default() -> Self {
    Self {
      runner: "src/xunit.console/bin/{config}/xunit.console.exe".to_string(),
      pattern: "test/test.xunit*/bin/{config}/test.xunit*.dll".to_string(),
      exclude: vec!["**/*.xunit1.dll".to_string()],
      legacy_pattern: "test/test.xunit1/bin/{config}/test.xunit1.dll".to_string(),
      results_dir: PathBuf::from(TEST_RESULTS_DIR),
      parallel_mode: ParallelMode::Collections,
      max_threads: 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackSettings {
  /// Directories zipped into the archive (path templates).
  pub directories: Vec<String>,
  pub extra_files: Vec<PathBuf>,
  pub output_dir: PathBuf,
  /// File extensions left out of the archive.
  pub exclusions: Vec<String>,
}

impl Default for PackSettings {
  fn default() -> Self {
    Self {
      directories: vec!["src/xunit.console/bin/{config}/".to_string()],
      extra_files: vec![PathBuf::from(VERSION_FILENAME)],
      output_dir: PathBuf::from(ARTIFACTS_DIR),
      exclusions: vec![".xml".to_string(), ".pdb".to_string(), ".nlp".to_string()],
    }
  }
}

/// Metadata stamped into the generated assembly info file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductSettings {
  pub title: String,
  pub company: String,
  /// Product name; empty means the solution's file stem.
  pub product: String,
  pub copyright: String,
  pub version_file: PathBuf,
  pub assembly_info: PathBuf,
}

impl Default for ProductSettings {
  fn default() -> Self {
    Self {
      title: String::new(),
      company: String::new(),
      product: String::new(),
      copyright: String::new(),
      version_file: PathBuf::from(VERSION_FILENAME),
      assembly_info: PathBuf::from("src/CommonAssemblyInfo.cs"),
    }
  }
}
