//! Cache layout for downloaded artifacts.
//!
//! A URL maps to `<cache_dir>/<host>/<path segments>`; extracted archive
//! members live under `<archive cache path>.extract/<member>`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Cache location for a remote URL.
pub fn cache_path(cache_dir: &Path, url: &str) -> PathBuf {
  let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
  let rest = rest.split(['?', '#']).next().unwrap_or(rest);
  let (host, path) = rest.split_once('/').unwrap_or((rest, ""));

  let segments: Vec<String> = path.split('/').filter_map(sanitize).collect();
  let host = sanitize(host);

  match (host, segments.is_empty()) {
    (Some(host), false) => segments.iter().fold(cache_dir.join(host), |acc, s| acc.join(s)),
    (host, _) => {
      let base = host.map(|h| cache_dir.join(h)).unwrap_or_else(|| cache_dir.to_path_buf());
      base.join(hashed_name(url))
    }
  }
}

/// Cache location of an extracted member of a cached archive.
pub fn member_cache_path(archive_cache: &Path, member: &str) -> PathBuf {
  let mut dir = archive_cache.as_os_str().to_os_string();
  dir.push(".extract");
  member
    .split('/')
    .filter_map(sanitize)
    .fold(PathBuf::from(dir), |acc, s| acc.join(s))
}

/// Make a single path segment safe to use on disk.
///
/// Returns `None` for segments that must not appear (`""`, `.`, `..`).
fn sanitize(segment: &str) -> Option<String> {
  let cleaned: String = segment
    .chars()
    .map(|c| {
      if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
        c
      } else {
        '_'
      }
    })
    .collect();

  if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
    None
  } else {
    Some(cleaned)
  }
}

fn hashed_name(url: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(url.as_bytes());
  format!("download_{}", &hex::encode(hasher.finalize())[..16])
}
