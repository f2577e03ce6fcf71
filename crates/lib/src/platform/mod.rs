//! Host platform detection.
//!
//! Decides which toolchain applies and how native tools are invoked: unix-like
//! hosts run .NET executables through a runtime launcher and take `-` switches,
//! Windows runs them directly and takes `/` switches.

mod os;
mod target;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_RUNTIME_LAUNCHER;

pub use os::{Os, host_identifier};
pub use target::PlatformTarget;

static UNIX_LIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new("linux|darwin").expect("valid regex"));

/// Compiler front end selected for a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toolchain {
  /// The Windows-native compiler (msbuild).
  Native,
  /// The cross-platform compiler (xbuild).
  CrossPlatform,
}

impl Toolchain {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Native => "native",
      Self::CrossPlatform => "cross_platform",
    }
  }
}

impl fmt::Display for Toolchain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The detected host and the invocation conventions that follow from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
  identifier: String,
  unix_like: bool,
  launcher: String,
}

impl HostPlatform {
  /// Detect the current host
  pub fn detect() -> Self {
    Self::from_os_identifier(&host_identifier())
  }

  /// Classify a host from its reported OS identifier.
  ///
  /// Any identifier containing `linux` or `darwin` is unix-like.
  pub fn from_os_identifier(identifier: &str) -> Self {
    Self {
      identifier: identifier.to_string(),
      unix_like: UNIX_LIKE.is_match(identifier),
      launcher: DEFAULT_RUNTIME_LAUNCHER.to_string(),
    }
  }

  /// Replace the runtime launcher used on unix-like hosts
  pub fn with_launcher(mut self, launcher: impl Into<String>) -> Self {
    self.launcher = launcher.into();
    self
  }

  pub fn identifier(&self) -> &str {
    &self.identifier
  }

  pub fn is_unix_like(&self) -> bool {
    self.unix_like
  }

  pub fn launcher(&self) -> &str {
    &self.launcher
  }

  pub fn toolchain(&self) -> Toolchain {
    if self.unix_like {
      Toolchain::CrossPlatform
    } else {
      Toolchain::Native
    }
  }

  /// Prefix a command line with the runtime launcher on unix-like hosts
  pub fn wrap_runtime_invocation(&self, command: &str) -> String {
    if self.unix_like {
      format!("{} {}", self.launcher, command)
    } else {
      command.to_string()
    }
  }

  pub fn argument_switch_prefix(&self) -> &'static str {
    if self.unix_like { "-" } else { "/" }
  }

  /// Render a tool switch in the host's style (e.g. `/p:Configuration=Release`)
  pub fn switch(&self, arg: &str) -> String {
    format!("{}{}", self.argument_switch_prefix(), arg)
  }
}

impl fmt::Display for HostPlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.identifier)
  }
}
