//! Project descriptor (`.csproj`) reading and patching.

mod derived;
mod hint_path;
mod model;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use derived::{
  DerivedDescriptor, QualifiedNameRewrite, cleanup_derived_descriptor, derived_path, prepare_derived_descriptor,
  rewrite_qualified_name,
};
pub use hint_path::{parent_segments, resolve_hint_path};
pub use model::ProjectDescriptor;

#[derive(Debug, Error)]
pub enum DescriptorError {
  #[error("file not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("failed to read {}: {source}", path.display())]
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

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to remove {}: {source}", path.display())]
  Remove {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed descriptor {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },
}

/// Rename the assembly in the descriptor at `path`, writing it back if anything changed.
pub fn patch_assembly_name(path: &Path, old: &str, new: &str) -> Result<bool, DescriptorError> {
  let mut descriptor = ProjectDescriptor::load(path)?;
  let changed = descriptor.set_assembly_name(old, new)?;
  if changed {
    descriptor.save()?;
  }
  Ok(changed)
}

/// Redirect output directories in the descriptor at `path`. Returns the number rewritten.
pub fn patch_output_path(path: &Path, suffix: &str) -> Result<usize, DescriptorError> {
  let mut descriptor = ProjectDescriptor::load(path)?;
  let count = descriptor.redirect_output_paths(suffix)?;
  if count > 0 {
    descriptor.save()?;
  }
  Ok(count)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{descriptor_xml, write_file};
  use tempfile::TempDir;

  #[test]
  fn patch_functions_write_back() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "a/a.csproj", &descriptor_xml("a", &[]));

    assert!(patch_assembly_name(&path, "a", "a.x86").unwrap());
    assert_eq!(patch_output_path(&path, "x86").unwrap(), 2);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("<AssemblyName>a.x86</AssemblyName>"));
    assert!(text.contains(r"<OutputPath>bin\Debug.x86\</OutputPath>"));

    // Second pass is a no-op.
    assert_eq!(patch_output_path(&path, "x86").unwrap(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
  }

  #[test]
  fn patch_missing_file() {
    let result = patch_assembly_name(Path::new("/nonexistent/nbake/a.csproj"), "a", "b");
    assert!(matches!(result, Err(DescriptorError::NotFound { .. })));
  }
}
