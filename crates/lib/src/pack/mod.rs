//! Flattened zip packaging of build output.
//!
//! Every file under the packed directories lands at the archive root under its
//! own file name. Two files with the same name would silently shadow each
//! other, so that case is rejected before anything is written.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum PackError {
  #[error("directory to pack does not exist: {}", path.display())]
  MissingDirectory { path: PathBuf },

  #[error("file to pack does not exist: {}", path.display())]
  MissingFile { path: PathBuf },

  #[error("duplicate archive entry '{name}': {} and {}", first.display(), second.display())]
  DuplicateEntry {
    name: String,
    first: PathBuf,
    second: PathBuf,
  },

  #[error("failed to scan {}: {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to write archive {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write archive {}: {source}", path.display())]
  Zip {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRequest {
  /// Directories whose files are packed (recursively, flattened).
  pub directories: Vec<PathBuf>,
  pub extra_files: Vec<PathBuf>,
  /// Entries whose name ends with one of these are skipped.
  pub exclusions: Vec<String>,
  pub archive: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackResult {
  pub archive: PathBuf,
  /// Entry names in archive order.
  pub entries: Vec<String>,
  pub excluded: usize,
}

/// `<product>-<version>-<short_hash>.zip`
pub fn archive_name(product: &str, version: &str, short_hash: &str) -> String {
  format!("{}-{}-{}.zip", product, version, short_hash)
}

/// Whether `name` ends with any excluded extension.
pub fn is_excluded(name: &str, exclusions: &[String]) -> bool {
  exclusions.iter().any(|ext| name.ends_with(ext.as_str()))
}

/// Collect, check and write the archive. An existing archive is overwritten.
pub fn pack(request: &PackRequest) -> Result<PackResult, PackError> {
  let (entries, excluded) = collect_entries(request)?;

  if let Some(parent) = request.archive.parent() {
    std::fs::create_dir_all(parent).map_err(|source| PackError::Io {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  let io_err = |source| PackError::Io {
    path: request.archive.clone(),
    source,
  };
  let zip_err = |source| PackError::Zip {
    path: request.archive.clone(),
    source,
  };

  let file = File::create(&request.archive).map_err(io_err)?;
  let mut zip = ZipWriter::new(file);
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  for (name, source) in &entries {
    zip.start_file(name.as_str(), options).map_err(zip_err)?;
    let mut input = File::open(source).map_err(|e| PackError::Io {
      path: source.clone(),
      source: e,
    })?;
    io::copy(&mut input, &mut zip).map_err(io_err)?;
  }
  zip.finish().map_err(zip_err)?;

  info!(archive = %request.archive.display(), entries = entries.len(), excluded, "archive written");
  Ok(PackResult {
    archive: request.archive.clone(),
    entries: entries.into_keys().collect(),
    excluded,
  })
}

/// Flattened entry name to source path, plus the number of excluded files.
fn collect_entries(request: &PackRequest) -> Result<(BTreeMap<String, PathBuf>, usize), PackError> {
  let mut entries = BTreeMap::new();
  let mut excluded = 0;

  let mut add = |path: PathBuf, entries: &mut BTreeMap<String, PathBuf>| -> Result<(), PackError> {
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    if is_excluded(&name, &request.exclusions) {
      debug!(path = %path.display(), "excluded from archive");
      excluded += 1;
      return Ok(());
    }
    if let Some(first) = entries.get(&name) {
      return Err(PackError::DuplicateEntry {
        name,
        first: PathBuf::clone(first),
        second: path,
      });
    }
    entries.insert(name, path);
    Ok(())
  };

  for dir in &request.directories {
    if !dir.is_dir() {
      return Err(PackError::MissingDirectory { path: dir.clone() });
    }
    for entry in WalkDir::new(dir).sort_by_file_name() {
      let entry = entry.map_err(|source| PackError::Walk {
        path: dir.clone(),
        source,
      })?;
      if entry.file_type().is_file() {
        add(entry.into_path(), &mut entries)?;
      }
    }
  }

  for file in &request.extra_files {
    if !file.is_file() {
      return Err(PackError::MissingFile { path: file.clone() });
    }
    add(file.clone(), &mut entries)?;
  }

  Ok((entries, excluded))
}

/// Resolve a root-relative archive location.
pub fn archive_path(root: &Path, output_dir: &Path, name: &str) -> PathBuf {
  root.join(output_dir).join(name)
}
