//! Version file handling and assembly info generation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum VersionError {
  #[error("failed to read version file {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid version '{value}' (expected major.minor.patch[.build])")]
  Parse { value: String },

  #[error("build number of {version} cannot be incremented further")]
  BuildOverflow { version: VersionNumber },
}

/// `major.minor.patch.build`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct VersionNumber {
  pub major: u32,
  pub minor: u32,
  pub patch: u32,
  pub build: u32,
}

impl Default for VersionNumber {
  fn default() -> Self {
    Self {
      major: 0,
      minor: 1,
      patch: 0,
      build: 0,
    }
  }
}

impl fmt::Display for VersionNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
  }
}

impl FromStr for VersionNumber {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let parse_err = || VersionError::Parse { value: s.to_string() };

    let parts = s
      .trim()
      .split('.')
      .map(|p| p.parse::<u32>().map_err(|_| parse_err()))
      .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
      [major, minor, patch] => Ok(Self {
        major: *major,
        minor: *minor,
        patch: *patch,
        build: 0,
      }),
      [major, minor, patch, build] => Ok(Self {
        major: *major,
        minor: *minor,
        patch: *patch,
        build: *build,
      }),
      _ => Err(parse_err()),
    }
  }
}

impl VersionNumber {
  /// Read from a version file; an absent file yields `0.1.0.0`.
  pub fn load(path: &Path) -> Result<Self, VersionError> {
    if !path.exists() {
      return Ok(Self::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| VersionError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    content.parse()
  }

  pub fn save(&self, path: &Path) -> Result<(), VersionError> {
    std::fs::write(path, format!("{}\n", self)).map_err(|source| VersionError::Write {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn next_build(self) -> Result<Self, VersionError> {
    let build = self
      .build
      .checked_add(1)
      .ok_or(VersionError::BuildOverflow { version: self })?;
    Ok(Self { build, ..self })
  }
}

/// Bump the build number stored in `path` and write it back.
pub fn increment_build(path: &Path) -> Result<VersionNumber, VersionError> {
  let version = VersionNumber::load(path)?.next_build()?;
  version.save(path)?;
  info!(version = %version, path = %path.display(), "incremented build number");
  Ok(version)
}

/// Values stamped into the generated assembly info file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyInfo {
  pub title: String,
  /// Full commit hash of the build.
  pub description: String,
  pub company: String,
  pub product: String,
  pub copyright: String,
  pub version: VersionNumber,
}

impl AssemblyInfo {
  pub fn render(&self) -> String {
    let attributes = [
      ("AssemblyTitle", self.title.clone()),
      ("AssemblyDescription", self.description.clone()),
      ("AssemblyCompany", self.company.clone()),
      ("AssemblyProduct", self.product.clone()),
      ("AssemblyCopyright", self.copyright.clone()),
      ("AssemblyVersion", self.version.to_string()),
      ("AssemblyFileVersion", self.version.to_string()),
    ];

    let mut out = String::from("using System.Reflection;\n\n");
    for (name, value) in attributes {
      out.push_str(&format!("[assembly: {}(\"{}\")]\n", name, escape(&value)));
    }
    out
  }
}

/// Write the C# assembly info file, creating its directory if needed.
pub fn write_assembly_info(path: &Path, info: &AssemblyInfo) -> Result<(), VersionError> {
  let write_err = |source| VersionError::Write {
    path: path.to_path_buf(),
    source,
  };
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).map_err(write_err)?;
  }
  std::fs::write(path, info.render()).map_err(write_err)?;
  info!(path = %path.display(), version = %info.version, "wrote assembly info");
  Ok(())
}

fn escape(value: &str) -> String {
  value.replace('\\', "\\\\").replace('"', "\\\"")
}
