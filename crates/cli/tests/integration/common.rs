//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Config pointing every external tool at a name that cannot be spawned, so
/// restore only warns and builds fail fast.
pub const OFFLINE_CONFIG: &str = r#"
[toolchain]
native = "nbake-missing-msbuild"
cross_platform = "nbake-missing-xbuild"
runtime_launcher = "nbake-missing-launcher"
"#;

/// Isolated project root.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A root with the offline config, a present NuGet binary and the variant
  /// project descriptor referencing `hint_paths`.
  pub fn project(hint_paths: &[&str]) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("nbake.toml", OFFLINE_CONFIG);
    env.write_file(".nuget/NuGet.exe", "not a real executable");
    env.write_file(
      "src/xunit.console/xunit.console.csproj",
      &descriptor_xml("xunit.console", hint_paths),
    );
    env
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  /// Write a file relative to the root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  /// Get a pre-configured Command for the nbake binary, rooted at the project.
  pub fn nbake_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("nbake");
    cmd.env_remove("RUST_LOG");
    cmd.arg("-C").arg(self.root());
    cmd
  }
}

/// A minimal project descriptor with the given assembly name and hint-paths.
pub fn descriptor_xml(assembly_name: &str, hint_paths: &[&str]) -> String {
  let references: String = hint_paths
    .iter()
    .map(|hint| format!("    <Reference Include=\"Dep\">\n      <HintPath>{}</HintPath>\n    </Reference>\n", hint))
    .collect();

  format!(
    r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <OutputType>Exe</OutputType>
    <AssemblyName>{assembly_name}</AssemblyName>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Release|AnyCPU' ">
    <OutputPath>bin\Release</OutputPath>
  </PropertyGroup>
  <ItemGroup>
{references}  </ItemGroup>
</Project>
"#
  )
}
