//! Session configuration.
//!
//! A [`ConfigProvider`] supplies the options a session needs to resolve
//! operation parameters: where downloads are cached, which suffix binaries
//! carry on this host, and whether download progress is suppressed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::platform::{self, paths};

/// Errors raised while retrieving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("config unavailable: {0}")]
  Unavailable(String),
}

/// Options consumed by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigOptions {
  /// Directory holding cached downloads.
  pub cache_dir: PathBuf,

  /// Suffix appended to binary names (e.g. `.exe`).
  pub bin_suffix: String,

  /// Suppress download progress output.
  pub quiet_pull: bool,
}

impl Default for ConfigOptions {
  fn default() -> Self {
    Self {
      cache_dir: paths::cache_dir(),
      bin_suffix: platform::binary_suffix().to_string(),
      quiet_pull: false,
    }
  }
}

/// Source of [`ConfigOptions`] for a session.
///
/// Retrieval may fail; callers surface the error unchanged.
pub trait ConfigProvider: Send + Sync {
  fn options(&self) -> Result<ConfigOptions, ConfigError>;
}

impl ConfigProvider for ConfigOptions {
  fn options(&self) -> Result<ConfigOptions, ConfigError> {
    Ok(self.clone())
  }
}

/// Configuration read from a JSON file on every request.
///
/// Missing keys fall back to [`ConfigOptions::default`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
  path: PathBuf,
}

impl ConfigFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// The user's default config file.
  pub fn default_location() -> Self {
    Self::new(paths::config_file())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl ConfigProvider for ConfigFile {
  fn options(&self) -> Result<ConfigOptions, ConfigError> {
    debug!(path = %self.path.display(), "loading config");
    let contents = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
      path: self.path.clone(),
      source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
      path: self.path.clone(),
      source,
    })
  }
}
