//! Download of the package manager executable.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::util::hash::{digest_matches, hash_bytes};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to download {url}: {message}")]
  Download { url: String, message: String },

  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Outcome of [`ensure_tool_present`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ToolStatus {
  AlreadyPresent,
  Downloaded { bytes: usize },
}

/// Make sure the executable at `path` exists, downloading it from `url` if not.
///
/// An existing file is never touched or re-verified. The download lands in a
/// temporary file next to `path` and is renamed into place only after the
/// optional SHA-256 check passes, so a failed or interrupted download leaves
/// nothing behind.
pub async fn ensure_tool_present(path: &Path, url: &str, sha256: Option<&str>) -> Result<ToolStatus, FetchError> {
  if path.exists() {
    debug!(path = %path.display(), "tool already present");
    return Ok(ToolStatus::AlreadyPresent);
  }

  info!(url = %url, path = %path.display(), "downloading tool");

  let download_err = |message: String| FetchError::Download {
    url: url.to_string(),
    message,
  };

  let response = reqwest::get(url).await.map_err(|e| download_err(e.to_string()))?;
  if !response.status().is_success() {
    return Err(download_err(format!("HTTP {}", response.status())));
  }
  let bytes = response.bytes().await.map_err(|e| download_err(e.to_string()))?;

  if let Some(expected) = sha256 {
    let actual = hash_bytes(&bytes);
    if !digest_matches(expected, &actual) {
      return Err(FetchError::HashMismatch {
        url: url.to_string(),
        expected: expected.to_string(),
        actual,
      });
    }
  }

  let write_err = |source| FetchError::Write {
    path: path.to_path_buf(),
    source,
  };

  let parent = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  std::fs::create_dir_all(parent).map_err(write_err)?;

  let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
  temp.write_all(&bytes).map_err(write_err)?;
  temp.flush().map_err(write_err)?;
  temp.persist(path).map_err(|e| write_err(e.error))?;

  info!(path = %path.display(), size = bytes.len(), "download complete");
  Ok(ToolStatus::Downloaded { bytes: bytes.len() })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  const BODY: &[u8] = b"MZ fake nuget";

  #[tokio::test]
  async fn existing_file_is_left_alone() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".nuget/NuGet.exe");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"original").unwrap();

    // Unreachable URL: nothing must be requested.
    let status = ensure_tool_present(&path, "http://127.0.0.1:1/nuget.exe", None)
      .await
      .unwrap();

    assert_eq!(status, ToolStatus::AlreadyPresent);
    assert_eq!(std::fs::read(&path).unwrap(), b"original");
  }

  #[tokio::test]
  async fn downloads_missing_file() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/nuget.exe")
      .with_status(200)
      .with_body(BODY)
      .create_async()
      .await;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".nuget/NuGet.exe");
    let url = format!("{}/nuget.exe", server.url());

    let status = ensure_tool_present(&path, &url, None).await.unwrap();

    mock.assert_async().await;
    assert_eq!(status, ToolStatus::Downloaded { bytes: BODY.len() });
    assert_eq!(std::fs::read(&path).unwrap(), BODY);
  }

  #[tokio::test]
  async fn verifies_checksum() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/nuget.exe")
      .with_body(BODY)
      .create_async()
      .await;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("NuGet.exe");
    let url = format!("{}/nuget.exe", server.url());
    let expected = hash_bytes(BODY).to_uppercase();

    let status = ensure_tool_present(&path, &url, Some(&expected)).await.unwrap();
    assert!(matches!(status, ToolStatus::Downloaded { .. }));
  }

  #[tokio::test]
  async fn checksum_mismatch_leaves_nothing_behind() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/nuget.exe")
      .with_body(BODY)
      .create_async()
      .await;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join(".nuget");
    let path = dir.join("NuGet.exe");
    let url = format!("{}/nuget.exe", server.url());

    let result = ensure_tool_present(&path, &url, Some(&"0".repeat(64))).await;

    assert!(matches!(result, Err(FetchError::HashMismatch { .. })));
    assert!(!path.exists());
    assert!(!dir.exists() || std::fs::read_dir(&dir).unwrap().next().is_none());
  }

  #[tokio::test]
  async fn http_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/nuget.exe")
      .with_status(404)
      .create_async()
      .await;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("NuGet.exe");
    let url = format!("{}/nuget.exe", server.url());

    let err = ensure_tool_present(&path, &url, None).await.unwrap_err();
    assert!(matches!(err, FetchError::Download { .. }));
    assert!(err.to_string().contains("404"));
    assert!(!path.exists());
  }
}
