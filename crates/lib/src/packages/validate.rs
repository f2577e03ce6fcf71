//! Check that every referenced package binary exists on disk.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::DirEntry;

use crate::descriptor::{DescriptorError, ProjectDescriptor, resolve_hint_path};
use crate::util::walk::{RelativeGlob, find_files, is_hidden};

#[derive(Debug, Error)]
pub enum ValidateError {
  #[error("invalid descriptor pattern '{pattern}': {source}")]
  Pattern {
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  #[error("failed to scan {}: {source}", root.display())]
  Walk {
    root: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error(transparent)]
  Descriptor(#[from] DescriptorError),
}

/// A hint-path whose resolved file does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingBinary {
  pub descriptor: PathBuf,
  pub hint_path: String,
  pub resolved: PathBuf,
}

impl MissingBinary {
  /// The line printed for each miss.
  pub fn message(&self) -> String {
    format!("Binary file {} is missing", self.resolved.display())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingPackageReport {
  pub checked_descriptors: usize,
  pub checked_references: usize,
  pub missing: Vec<MissingBinary>,
}

impl MissingPackageReport {
  /// Exact number of missing files.
  pub fn count(&self) -> usize {
    self.missing.len()
  }

  pub fn is_complete(&self) -> bool {
    self.missing.is_empty()
  }
}

/// A `bin` or `obj` directory next to a descriptor, i.e. some project's build output.
fn is_build_output(entry: &DirEntry, root: &Path, glob: &RelativeGlob) -> bool {
  if entry.depth() == 0 || !matches!(entry.file_name().to_str(), Some("bin" | "obj")) {
    return false;
  }
  let Some(parent) = entry.path().parent() else {
    return false;
  };
  let Ok(siblings) = std::fs::read_dir(parent) else {
    return false;
  };
  siblings.flatten().any(|sibling| {
    let path = sibling.path();
    path.is_file() && glob.matches(path.strip_prefix(root).unwrap_or(&path))
  })
}

/// Scan every descriptor under `root` matching `pattern` and check its hint-paths.
///
/// Hidden directories and project build output (`bin`, `obj` beside a
/// descriptor) are skipped. An unparseable descriptor is an error, not a miss.
pub fn validate(root: &Path, pattern: &str) -> Result<MissingPackageReport, ValidateError> {
  let glob = RelativeGlob::new(pattern).map_err(|source| ValidateError::Pattern {
    pattern: pattern.to_string(),
    source,
  })?;

  let descriptors = find_files(root, &glob, |e| is_hidden(e) || is_build_output(e, root, &glob))
  .map_err(|source| ValidateError::Walk {
    root: root.to_path_buf(),
    source,
  })?;

  let mut report = MissingPackageReport::default();

  for path in descriptors {
    let descriptor = ProjectDescriptor::load(&path)?;
    let dir = path.parent().unwrap_or(root);
    report.checked_descriptors += 1;

    for hint in descriptor.hint_paths()? {
      report.checked_references += 1;
      let resolved = resolve_hint_path(dir, &hint);
      if resolved.is_file() {
        continue;
      }
      debug!(descriptor = %path.display(), hint = %hint, resolved = %resolved.display(), "binary missing");
      report.missing.push(MissingBinary {
        descriptor: path.clone(),
        hint_path: hint,
        resolved,
      });
    }
  }

  info!(
    descriptors = report.checked_descriptors,
    references = report.checked_references,
    missing = report.count(),
    "package validation finished"
  );
  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{descriptor_xml, write_file};
  use tempfile::TempDir;

  const PATTERN: &str = "**/*.csproj";

  #[test]
  fn all_present_reports_zero() {
    let temp = TempDir::new().unwrap();
    write_file(
      temp.path(),
      "src/app/app.csproj",
      &descriptor_xml("app", &[r"..\..\packages\x\lib\x.dll"]),
    );
    write_file(temp.path(), "packages/x/lib/x.dll", "bin");

    let report = validate(temp.path(), PATTERN).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.checked_descriptors, 1);
    assert_eq!(report.checked_references, 1);
  }

  #[test]
  fn counts_every_missing_binary_exactly() {
    let temp = TempDir::new().unwrap();
    write_file(
      temp.path(),
      "src/a/a.csproj",
      &descriptor_xml("a", &[r"..\..\packages\x\x.dll", r"..\..\packages\y\y.dll"]),
    );
    write_file(
      temp.path(),
      "src/b/b.csproj",
      &descriptor_xml("b", &[r"..\..\packages\x\x.dll", r"..\..\packages\z\z.dll"]),
    );
    write_file(temp.path(), "packages/x/x.dll", "bin");

    let report = validate(temp.path(), PATTERN).unwrap();

    assert_eq!(report.count(), 2);
    assert_eq!(report.checked_references, 4);
    assert_eq!(report.missing[0].hint_path, r"..\..\packages\y\y.dll");
    assert_eq!(report.missing[0].resolved, temp.path().join("packages/y/y.dll"));
    assert_eq!(
      report.missing[1].message(),
      format!("Binary file {} is missing", temp.path().join("packages/z/z.dll").display())
    );
  }

  #[test]
  fn directory_at_hint_path_counts_as_missing() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "app.csproj", &descriptor_xml("app", &[r"lib\x.dll"]));
    std::fs::create_dir_all(temp.path().join("lib/x.dll")).unwrap();

    assert_eq!(validate(temp.path(), PATTERN).unwrap().count(), 1);
  }

  #[test]
  fn skips_hidden_and_build_output_directories() {
    let temp = TempDir::new().unwrap();
    let missing = descriptor_xml("m", &[r"missing.dll"]);
    write_file(temp.path(), ".git/x/x.csproj", &missing);
    write_file(temp.path(), "src/app/app.csproj", &descriptor_xml("app", &[]));
    write_file(temp.path(), "src/app/obj/x.csproj", &missing);
    write_file(temp.path(), "src/app/bin/Release/x.csproj", &missing);

    let report = validate(temp.path(), PATTERN).unwrap();
    assert_eq!(report.checked_descriptors, 1);
    assert!(report.is_complete());
  }

  #[test]
  fn bin_directory_without_a_sibling_descriptor_is_scanned() {
    let temp = TempDir::new().unwrap();
    write_file(
      temp.path(),
      "tools/bin/Foo/Foo.csproj",
      &descriptor_xml("Foo", &[r"..\..\..\packages\foo\foo.dll"]),
    );
    write_file(temp.path(), "obj/Bar.csproj", &descriptor_xml("Bar", &[r"bar.dll"]));

    let report = validate(temp.path(), PATTERN).unwrap();
    assert_eq!(report.checked_descriptors, 2);
    assert_eq!(report.count(), 2);
    assert_eq!(report.missing[1].resolved, temp.path().join("packages/foo/foo.dll"));
  }

  #[test]
  fn derived_descriptors_are_checked_too() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/app/app.x86.csproj", &descriptor_xml("app.x86", &[r"..\gone.dll"]));

    assert_eq!(validate(temp.path(), PATTERN).unwrap().count(), 1);
  }

  #[test]
  fn malformed_descriptor_is_an_error() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/bad/bad.csproj", "<Project><Reference>");

    let result = validate(temp.path(), PATTERN);
    assert!(matches!(
      result,
      Err(ValidateError::Descriptor(DescriptorError::Parse { .. }))
    ));
  }

  #[test]
  fn invalid_pattern_is_an_error() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
      validate(temp.path(), "[unclosed"),
      Err(ValidateError::Pattern { .. })
    ));
  }
}
