use std::fmt;

use serde::{Deserialize, Serialize};

/// Processor architecture a project is compiled for (`PlatformTarget` build property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformTarget {
  /// Whatever the project file declares; no property is passed.
  #[default]
  Default,
  X86,
}

impl PlatformTarget {
  /// Returns the value passed to the compiler, or `None` for the project default
  pub fn property_value(&self) -> Option<&'static str> {
    match self {
      Self::Default => None,
      Self::X86 => Some("x86"),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Default => "default",
      Self::X86 => "x86",
    }
  }
}

impl fmt::Display for PlatformTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
