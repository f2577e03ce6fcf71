use std::fmt;

/// Operating system families nbake distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "win32",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Returns the host identifier in `<arch>-<os>` form (e.g. "x86_64-linux").
///
/// Unknown operating systems keep the raw name reported by the standard library.
pub fn host_identifier() -> String {
  let os = Os::current().map(|os| os.as_str()).unwrap_or(std::env::consts::OS);
  format!("{}-{}", std::env::consts::ARCH, os)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn macos_uses_darwin_identifier() {
    assert_eq!(Os::MacOs.as_str(), "darwin");
  }

  #[test]
  fn host_identifier_has_arch_prefix() {
    let id = host_identifier();
    assert!(id.starts_with(std::env::consts::ARCH));
    assert!(id.contains('-'));
  }
}
