//! SHA-256 helpers for verifying downloaded tools.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a byte slice.
pub fn hash_bytes(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

/// Compare two hex digests ignoring case.
pub fn digest_matches(expected: &str, actual: &str) -> bool {
  expected.trim().eq_ignore_ascii_case(actual)
}
