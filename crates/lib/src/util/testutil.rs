//! Test utilities for nbake-lib.
//!
//! Cross-platform stand-ins for the external tools and helpers for laying out
//! a fake solution tree on disk.

use std::path::{Path, PathBuf};

use crate::process::Invocation;

/// Returns an invocation that runs a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> Invocation {
  Invocation::new("/bin/sh").args(["-c", script])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> Invocation {
  Invocation::new("cmd.exe").args(["/C", script])
}

/// Returns an invocation that echoes a message.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> Invocation {
  Invocation::new("/bin/echo").arg(msg)
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> Invocation {
  Invocation::new("cmd.exe").arg("/C").arg(format!("echo {}", msg))
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
  path
}

/// A minimal project descriptor with the given assembly name and hint-paths.
pub fn descriptor_xml(assembly_name: &str, hint_paths: &[&str]) -> String {
  let references: String = hint_paths
    .iter()
    .map(|hint| {
      format!(
        "    <Reference Include=\"Dep\">\n      <HintPath>{}</HintPath>\n    </Reference>\n",
        hint
      )
    })
    .collect();

  format!(
    r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <OutputType>Exe</OutputType>
    <AssemblyName>{assembly_name}</AssemblyName>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Debug|AnyCPU' ">
    <OutputPath>bin\Debug</OutputPath>
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
