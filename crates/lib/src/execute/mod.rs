//! Apply/simulate strategies.
//!
//! Every side-effecting operation goes through an [`Executor`]. A session
//! picks one implementation when it is created:
//! - [`RealExecutor`] forwards to the filesystem, download and PKI collaborators
//! - [`SimulatingExecutor`] renders transcript entries instead

mod real;
mod simulate;
pub mod types;

use std::path::Path;

use async_trait::async_trait;

use crate::download::DownloadRequest;
use crate::files::FileWriter;

pub use real::RealExecutor;
pub use simulate::SimulatingExecutor;
pub use types::ExecuteError;

/// One method per operation kind, shared by both strategies.
#[async_trait]
pub trait Executor: Send + Sync {
  fn create_file(&self, path: &Path) -> Result<(), ExecuteError>;

  fn copy_file(&self, from: &Path, to: &Path) -> Result<(), ExecuteError>;

  fn rename_file(&self, from: &Path, to: &Path) -> Result<(), ExecuteError>;

  fn append_to_file(&self, path: &Path, content: &[u8]) -> Result<(), ExecuteError>;

  fn remove(&self, path: &Path) -> Result<(), ExecuteError>;

  fn remove_all(&self, path: &Path) -> Result<(), ExecuteError>;

  fn open_file(&self, path: &Path) -> Result<Box<dyn FileWriter>, ExecuteError>;

  fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), ExecuteError>;

  fn write_file_with_mode(&self, path: &Path, content: &[u8], mode: u32) -> Result<(), ExecuteError>;

  fn mkdir_all(&self, path: &Path) -> Result<(), ExecuteError>;

  async fn download_with_cache(&self, request: &DownloadRequest) -> Result<(), ExecuteError>;

  async fn download_with_cache_and_extract(&self, request: &DownloadRequest, member: &str)
  -> Result<(), ExecuteError>;

  fn generate_pki(&self, path: &Path, sans: &[String]) -> Result<(), ExecuteError>;
}
