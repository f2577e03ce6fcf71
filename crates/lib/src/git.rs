//! Commit identification for version stamping and archive names.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

const SHORT_HASH_LEN: usize = 7;

/// The commit a build is produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
  pub hash: String,
  pub short_hash: String,
}

impl CommitInfo {
  /// Placeholder used when `root` is not inside a repository.
  pub fn unknown() -> Self {
    Self {
      hash: "unknown".to_string(),
      short_hash: "0".repeat(SHORT_HASH_LEN),
    }
  }

  pub fn from_hash(hash: impl Into<String>) -> Self {
    let hash = hash.into();
    let short_hash = hash.chars().take(SHORT_HASH_LEN).collect();
    Self { hash, short_hash }
  }

  /// HEAD of the repository containing `root`, or [`unknown`](Self::unknown).
  pub fn discover(root: &Path) -> Self {
    match head_commit(root) {
      Ok(hash) => {
        debug!(commit = %hash, "resolved HEAD");
        Self::from_hash(hash)
      }
      Err(message) => {
        warn!(root = %root.display(), error = %message, "could not resolve commit, using placeholder");
        Self::unknown()
      }
    }
  }
}

fn head_commit(root: &Path) -> Result<String, String> {
  let repo = gix::discover(root).map_err(|e| e.to_string())?;
  let mut head = repo.head().map_err(|e| e.to_string())?;
  let commit = head.peel_to_commit().map_err(|e| e.to_string())?;
  Ok(commit.id.to_string())
}
