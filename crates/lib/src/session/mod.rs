//! Provisioning sessions.
//!
//! A [`Session`] carries the mode of one provisioning run and exposes one
//! entry point per side-effecting operation. The executor (real or
//! simulating) is chosen once, when the session is created; every call after
//! that goes straight to it.

mod mode;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{ConfigOptions, ConfigProvider};
use crate::consts::{BIN_DIR, BINARY_MODE};
use crate::download::{CacheDownloader, DownloadRequest, Downloader, SourceDescriptor};
use crate::execute::{ExecuteError, Executor, RealExecutor, SimulatingExecutor};
use crate::files::FileWriter;
use crate::pki::{PkiGenerator, RcgenPki};
use crate::transcript::{StdoutSink, TranscriptSink};

pub use mode::Mode;

/// Options fixed for the lifetime of a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
  /// Working directory of the run; binaries land in `<workdir>/bin`.
  pub workdir: PathBuf,

  /// Mode flags.
  pub mode: Mode,
}

/// External services a session dispatches to.
pub struct Collaborators {
  /// Source of cache directory, binary suffix and quiet-pull settings.
  pub config: Arc<dyn ConfigProvider>,

  /// Receives rendered operations while simulating.
  pub transcript: Arc<dyn TranscriptSink>,

  /// Performs real downloads.
  pub downloader: Arc<dyn Downloader>,

  /// Generates key and certificate bundles in apply mode.
  pub pki: Arc<dyn PkiGenerator>,
}

impl Default for Collaborators {
  fn default() -> Self {
    Self {
      config: Arc::new(ConfigOptions::default()),
      transcript: Arc::new(StdoutSink),
      downloader: Arc::new(CacheDownloader::new()),
      pki: Arc::new(RcgenPki),
    }
  }
}

/// Policy object for one provisioning run.
pub struct Session {
  mode: Mode,
  workdir: PathBuf,
  config: Arc<dyn ConfigProvider>,
  executor: Box<dyn Executor>,
}

impl Session {
  /// Create a session with the default collaborators.
  pub fn new(options: SessionOptions) -> Self {
    Self::with_collaborators(options, Collaborators::default())
  }

  /// Create a session that dispatches to `collaborators`.
  pub fn with_collaborators(options: SessionOptions, collaborators: Collaborators) -> Self {
    let mode = options.mode;
    let executor: Box<dyn Executor> = if mode.is_simulating() {
      let executor = SimulatingExecutor::new(collaborators.transcript);
      if mode.should_download_for_real() {
        Box::new(executor.with_real_downloads(collaborators.downloader))
      } else {
        Box::new(executor)
      }
    } else {
      Box::new(RealExecutor::new(collaborators.downloader, collaborators.pki))
    };

    debug!(
      workdir = %options.workdir.display(),
      simulate = mode.simulate,
      allow_real_download = mode.allow_real_download,
      "session created"
    );

    Self {
      mode,
      workdir: options.workdir,
      config: collaborators.config,
      executor,
    }
  }

  /// Mode flags the session was created with.
  pub fn mode(&self) -> Mode {
    self.mode
  }

  /// Whether operations are rendered instead of performed.
  pub fn is_simulating(&self) -> bool {
    self.mode.is_simulating()
  }

  /// Whether downloads reach the real downloader.
  pub fn should_download_for_real(&self) -> bool {
    self.mode.should_download_for_real()
  }

  /// Working directory of the run.
  pub fn workdir(&self) -> &Path {
    &self.workdir
  }

  /// Path of `file_name` inside the session's binary directory.
  pub fn bin_path(&self, file_name: &str) -> PathBuf {
    self.workdir.join(BIN_DIR).join(file_name)
  }

  /// Current configuration options.
  pub fn config(&self) -> Result<ConfigOptions, ExecuteError> {
    Ok(self.config.options()?)
  }

  /// Create an empty file (`touch`).
  pub fn create_file(&self, path: &Path) -> Result<(), ExecuteError> {
    self.executor.create_file(path)
  }

  /// Copy `from` to `to` (`cp`).
  pub fn copy_file(&self, from: &Path, to: &Path) -> Result<(), ExecuteError> {
    self.executor.copy_file(from, to)
  }

  /// Move `from` to `to` (`mv`).
  pub fn rename_file(&self, from: &Path, to: &Path) -> Result<(), ExecuteError> {
    self.executor.rename_file(from, to)
  }

  /// Append `content`, creating the file if needed.
  pub fn append_to_file(&self, path: &Path, content: &[u8]) -> Result<(), ExecuteError> {
    self.executor.append_to_file(path, content)
  }

  /// Remove a single file (`rm`).
  pub fn remove(&self, path: &Path) -> Result<(), ExecuteError> {
    self.executor.remove(path)
  }

  /// Remove a directory tree (`rm -rf`).
  pub fn remove_all(&self, path: &Path) -> Result<(), ExecuteError> {
    self.executor.remove_all(path)
  }

  /// Open `path` for streaming writes. The caller must close the writer.
  pub fn open_file(&self, path: &Path) -> Result<Box<dyn FileWriter>, ExecuteError> {
    self.executor.open_file(path)
  }

  /// Overwrite `path` with `content`.
  pub fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), ExecuteError> {
    self.executor.write_file(path, content)
  }

  /// Overwrite `path` with `content` and set its permission bits.
  pub fn write_file_with_mode(&self, path: &Path, content: &[u8], mode: u32) -> Result<(), ExecuteError> {
    self.executor.write_file_with_mode(path, content, mode)
  }

  /// Create a directory and its parents (`mkdir -p`).
  pub fn mkdir_all(&self, path: &Path) -> Result<(), ExecuteError> {
    self.executor.mkdir_all(path)
  }

  /// Resolve a source descriptor into `dest`, going through the cache.
  ///
  /// `source` is either `SOURCE` or `SOURCE#MEMBER`; the latter extracts
  /// `MEMBER` from the archive at `SOURCE`.
  pub async fn download_with_cache(
    &self,
    cache_dir: &Path,
    source: &str,
    dest: &Path,
    mode: u32,
    quiet: bool,
  ) -> Result<(), ExecuteError> {
    let descriptor = SourceDescriptor::parse(source);
    let request = DownloadRequest {
      cache_dir: cache_dir.to_path_buf(),
      source: descriptor.location.to_string(),
      dest: dest.to_path_buf(),
      mode,
      quiet,
      simulate: self.is_simulating(),
    };

    match descriptor.member {
      Some(member) => self.executor.download_with_cache_and_extract(&request, member).await,
      None => self.executor.download_with_cache(&request).await,
    }
  }

  /// Generate a PKI bundle at `path` valid for `sans`.
  pub fn generate_pki(&self, path: &Path, sans: &[String]) -> Result<(), ExecuteError> {
    self.executor.generate_pki(path, sans)
  }

  /// Make sure binary `name` exists in the session's binary directory.
  ///
  /// Returns the binary's path. When the download was simulated the path is
  /// returned even though nothing exists there.
  pub async fn ensure_binary(&self, name: &str, source: &str) -> Result<PathBuf, ExecuteError> {
    let options = self.config()?;

    let binary_path = self.bin_path(&format!("{}{}", name, options.bin_suffix));
    self
      .download_with_cache(&options.cache_dir, source, &binary_path, BINARY_MODE, options.quiet_pull)
      .await?;

    info!(name, path = %binary_path.display(), "binary ready");
    Ok(binary_path)
  }
}
