//! Glob-driven file discovery under a root.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern, PatternError};
use walkdir::{DirEntry, WalkDir};

/// `*` never crosses a path separator; `**/` spans directories.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: false,
};

/// A compiled root-relative glob.
#[derive(Debug, Clone)]
pub struct RelativeGlob(Pattern);

impl RelativeGlob {
  pub fn new(pattern: &str) -> Result<Self, PatternError> {
    Pattern::new(&pattern.replace('\\', "/")).map(Self)
  }

  /// Match a path relative to the walk root.
  pub fn matches(&self, relative: &Path) -> bool {
    self.0.matches_with(&to_slash(relative), MATCH_OPTIONS)
  }

  pub fn as_str(&self) -> &str {
    self.0.as_str()
  }
}

/// Root-relative path with `/` separators.
pub fn to_slash(relative: &Path) -> String {
  relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

/// Whether a directory entry below the root is hidden (`.git`, `.nuget`, ...).
pub fn is_hidden(entry: &DirEntry) -> bool {
  entry.depth() > 0 && entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// Sorted regular files under `root` whose relative path matches `glob`.
///
/// Directories for which `prune` returns true are not descended into.
pub fn find_files(
  root: &Path,
  glob: &RelativeGlob,
  prune: impl Fn(&DirEntry) -> bool,
) -> Result<Vec<PathBuf>, walkdir::Error> {
  let mut found = Vec::new();

  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| !(e.file_type().is_dir() && prune(e)));

  for entry in walker {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    if glob.matches(relative) {
      found.push(entry.into_path());
    }
  }

  found.sort();
  Ok(found)
}
