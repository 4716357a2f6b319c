//! Cache-aware downloads.
//!
//! [`Downloader`] is the seam the session dispatches to when a download must
//! really happen. [`CacheDownloader`] is the default implementation: remote
//! sources are fetched once into a cache directory and copied to their
//! destination; archive members are extracted on the way.

pub mod cache;
pub mod extract;
pub mod source;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::consts::DIR_MODE;
use extract::ArchiveKind;
pub use source::{Source, SourceDescriptor};

/// Errors that can occur while downloading or extracting.
#[derive(Debug, Error)]
pub enum DownloadError {
  #[error("empty download source")]
  EmptySource,

  #[error("unsupported download source: {0}")]
  UnsupportedSource(String),

  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("download of {url} failed: HTTP {status}")]
  Http { url: String, status: u16 },

  #[error("unsupported archive: {0}")]
  UnsupportedArchive(String),

  #[error("member {member} not found in archive {archive}")]
  MemberNotFound { archive: String, member: String },

  #[error("failed to read archive {archive}: {message}")]
  Archive { archive: String, message: String },

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("extraction task failed: {0}")]
  Task(String),
}

impl DownloadError {
  pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> DownloadError {
    let path = path.to_path_buf();
    move |source| DownloadError::Io { path, source }
  }
}

/// Parameters of one download, as resolved by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
  /// Directory holding cached downloads.
  pub cache_dir: PathBuf,
  /// Fetch location, already stripped of any `#member` suffix.
  pub source: String,
  /// Where the artifact must end up.
  pub dest: PathBuf,
  /// Permission bits for `dest`.
  pub mode: u32,
  /// Suppress progress output.
  pub quiet: bool,
  /// The surrounding session is simulating. The artifact is still placed at
  /// `dest`, but no new cache entries are written.
  pub simulate: bool,
}

/// Performs real downloads.
#[async_trait]
pub trait Downloader: Send + Sync {
  /// Fetch `request.source` to `request.dest`.
  async fn download_with_cache(&self, request: &DownloadRequest) -> Result<(), DownloadError>;

  /// Fetch the archive at `request.source` and extract `member` to `request.dest`.
  async fn download_with_cache_and_extract(&self, request: &DownloadRequest, member: &str)
  -> Result<(), DownloadError>;
}

/// Default [`Downloader`] backed by reqwest and an on-disk cache.
#[derive(Debug, Clone, Default)]
pub struct CacheDownloader {
  client: reqwest::Client,
}

impl CacheDownloader {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_client(client: reqwest::Client) -> Self {
    Self { client }
  }

  /// Fetch `url` into a temp file inside `dir`.
  async fn fetch(&self, url: &str, dir: &Path, quiet: bool) -> Result<NamedTempFile, DownloadError> {
    if quiet {
      debug!(url = %url, "fetching URL");
    } else {
      info!(url = %url, "fetching URL");
    }

    create_dir_all(dir).await?;

    let mut response = self.client.get(url).send().await.map_err(|source| DownloadError::Request {
      url: url.to_string(),
      source,
    })?;

    if !response.status().is_success() {
      return Err(DownloadError::Http {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    let mut tmp = tempfile::Builder::new()
      .prefix(".download-")
      .tempfile_in(dir)
      .map_err(DownloadError::io(dir))?;

    let mut size = 0usize;
    while let Some(chunk) = response.chunk().await.map_err(|source| DownloadError::Request {
      url: url.to_string(),
      source,
    })? {
      tmp.write_all(&chunk).map_err(DownloadError::io(tmp.path()))?;
      size += chunk.len();
    }
    tmp.flush().map_err(DownloadError::io(tmp.path()))?;

    if quiet {
      debug!(url = %url, size, "download complete");
    } else {
      info!(url = %url, size, "download complete");
    }
    Ok(tmp)
  }

  /// Ensure `url` is present in the cache and return its cache path.
  async fn cached(&self, url: &str, cache_dir: &Path, quiet: bool) -> Result<PathBuf, DownloadError> {
    let cache_path = cache::cache_path(cache_dir, url);
    if fs::try_exists(&cache_path).await.unwrap_or(false) {
      debug!(path = %cache_path.display(), "using cached file");
      return Ok(cache_path);
    }

    let dir = parent_of(&cache_path);
    let tmp = self.fetch(url, &dir, quiet).await?;
    persist(tmp, &cache_path)?;
    Ok(cache_path)
  }
}

#[async_trait]
impl Downloader for CacheDownloader {
  async fn download_with_cache(&self, request: &DownloadRequest) -> Result<(), DownloadError> {
    if fs::try_exists(&request.dest).await.unwrap_or(false) {
      debug!(dest = %request.dest.display(), "destination exists, skipping download");
      return Ok(());
    }

    match Source::classify(&request.source)? {
      Source::Local(path) => install(&path, &request.dest, request.mode).await,
      Source::Remote(url) => {
        let cache_path = cache::cache_path(&request.cache_dir, &url);
        let cache_hit = fs::try_exists(&cache_path).await.unwrap_or(false);

        if request.simulate && !cache_hit {
          let dir = parent_of(&request.dest);
          let tmp = self.fetch(&url, &dir, request.quiet).await?;
          persist(tmp, &request.dest)?;
          set_mode(&request.dest, request.mode).await
        } else {
          let cache_path = self.cached(&url, &request.cache_dir, request.quiet).await?;
          install(&cache_path, &request.dest, request.mode).await
        }
      }
    }
  }

  async fn download_with_cache_and_extract(
    &self,
    request: &DownloadRequest,
    member: &str,
  ) -> Result<(), DownloadError> {
    if fs::try_exists(&request.dest).await.unwrap_or(false) {
      debug!(dest = %request.dest.display(), "destination exists, skipping extraction");
      return Ok(());
    }

    let source = Source::classify(&request.source)?;
    let kind = ArchiveKind::detect(&request.source)?;

    match source {
      Source::Local(archive) => extract_to(archive, kind, member, &request.dest, request.mode).await,
      Source::Remote(url) => {
        let cache_path = cache::cache_path(&request.cache_dir, &url);
        let cache_hit = fs::try_exists(&cache_path).await.unwrap_or(false);

        if request.simulate {
          if cache_hit {
            return extract_to(cache_path, kind, member, &request.dest, request.mode).await;
          }
          let dir = parent_of(&request.dest);
          let tmp = self.fetch(&url, &dir, request.quiet).await?;
          let result = extract_to(tmp.path().to_path_buf(), kind, member, &request.dest, request.mode).await;
          drop(tmp);
          return result;
        }

        let cache_path = self.cached(&url, &request.cache_dir, request.quiet).await?;
        let member_cache = cache::member_cache_path(&cache_path, member);
        if !fs::try_exists(&member_cache).await.unwrap_or(false) {
          extract_to(cache_path, kind, member, &member_cache, request.mode).await?;
        } else {
          debug!(path = %member_cache.display(), "using cached member");
        }
        install(&member_cache, &request.dest, request.mode).await
      }
    }
  }
}

/// Extract `member` of `archive` into `dest` atomically.
async fn extract_to(archive: PathBuf, kind: ArchiveKind, member: &str, dest: &Path, mode: u32) -> Result<(), DownloadError> {
  let dir = parent_of(dest);
  create_dir_all(&dir).await?;

  let member = member.to_string();
  let target = dest.to_path_buf();
  tokio::task::spawn_blocking(move || -> Result<(), DownloadError> {
    let mut tmp = tempfile::Builder::new()
      .prefix(".extract-")
      .tempfile_in(&dir)
      .map_err(DownloadError::io(&dir))?;
    extract::extract_member(&archive, kind, &member, &mut tmp)?;
    tmp.flush().map_err(DownloadError::io(tmp.path()))?;
    persist(tmp, &target)
  })
  .await
  .map_err(|e| DownloadError::Task(e.to_string()))??;

  info!(dest = %dest.display(), "extracted archive member");
  set_mode(dest, mode).await
}

/// Copy `from` to `dest` and apply `mode`.
async fn install(from: &Path, dest: &Path, mode: u32) -> Result<(), DownloadError> {
  create_dir_all(&parent_of(dest)).await?;
  fs::copy(from, dest).await.map_err(DownloadError::io(from))?;
  debug!(from = %from.display(), dest = %dest.display(), "installed");
  set_mode(dest, mode).await
}

fn persist(tmp: NamedTempFile, dest: &Path) -> Result<(), DownloadError> {
  tmp.persist(dest).map_err(|e| DownloadError::Io {
    path: dest.to_path_buf(),
    source: e.error,
  })?;
  Ok(())
}

fn parent_of(path: &Path) -> PathBuf {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => PathBuf::from("."),
  }
}

async fn create_dir_all(dir: &Path) -> Result<(), DownloadError> {
  let mut builder = fs::DirBuilder::new();
  builder.recursive(true);
  #[cfg(unix)]
  builder.mode(DIR_MODE);
  builder.create(dir).await.map_err(DownloadError::io(dir))
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), DownloadError> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    .await
    .map_err(DownloadError::io(path))
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), DownloadError> {
  Ok(())
}
