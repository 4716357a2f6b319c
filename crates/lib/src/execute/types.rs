//! Error types for operation dispatch.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::download::DownloadError;
use crate::files::FsError;
use crate::pki::PkiError;

/// Errors returned by session operations.
///
/// Collaborator errors pass through transparently: the message and source
/// chain are exactly those of the underlying failure.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Fs(#[from] FsError),

  #[error(transparent)]
  Download(#[from] DownloadError),

  #[error(transparent)]
  Pki(#[from] PkiError),

  /// The transcript sink refused an entry.
  #[error("failed to emit transcript: {0}")]
  Transcript(#[source] io::Error),
}
