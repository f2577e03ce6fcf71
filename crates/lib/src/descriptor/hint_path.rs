use std::path::{Path, PathBuf};

/// Resolve a descriptor hint-path against the descriptor's directory.
///
/// Hint-paths use Windows separators. Every `..\` segment walks one level up
/// from `descriptor_dir` (never past the filesystem root); the remaining
/// segments are joined onto the result.
pub fn resolve_hint_path(descriptor_dir: &Path, hint: &str) -> PathBuf {
  let mut base = descriptor_dir.to_path_buf();
  let mut rest = Vec::new();

  for segment in hint.split(['\\', '/']) {
    match segment {
      ".." => {
        base.pop();
      }
      "" | "." => {}
      other => rest.push(other),
    }
  }

  rest.into_iter().fold(base, |path, segment| path.join(segment))
}

/// Number of parent-directory segments in a hint-path.
pub fn parent_segments(hint: &str) -> usize {
  hint.split(['\\', '/']).filter(|s| *s == "..").count()
}
