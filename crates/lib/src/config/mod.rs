//! Project configuration.
//!
//! Settings are read once at startup from `nbake.toml` and passed down as an
//! immutable value; nothing reads configuration from ambient global state.

mod types;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use types::{
  BuildConfiguration, NugetSettings, PackSettings, PackageFeedSet, PackageSpec, ProductSettings, Settings,
  TestSettings, ToolchainSettings, VariantSettings, with_configuration,
};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("package feed list must not be empty")]
  EmptyFeedSet,
}

impl Settings {
  /// Load settings from a TOML file.
  ///
  /// A missing file yields the defaults; a present but malformed file is an error.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    if !path.exists() {
      info!(path = %path.display(), "no config file, using defaults");
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    debug!(path = %path.display(), "loaded config");
    Ok(settings)
  }
}
