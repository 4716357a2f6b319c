use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::{ExecuteError, Executor};
use crate::download::{DownloadRequest, Downloader};
use crate::files::{self, FileWriter};
use crate::pki::PkiGenerator;

/// Performs every operation for real.
pub struct RealExecutor {
  downloader: Arc<dyn Downloader>,
  pki: Arc<dyn PkiGenerator>,
}

impl RealExecutor {
  pub fn new(downloader: Arc<dyn Downloader>, pki: Arc<dyn PkiGenerator>) -> Self {
    Self { downloader, pki }
  }
}

#[async_trait]
impl Executor for RealExecutor {
  fn create_file(&self, path: &Path) -> Result<(), ExecuteError> {
    Ok(files::create(path)?)
  }

  fn copy_file(&self, from: &Path, to: &Path) -> Result<(), ExecuteError> {
    Ok(files::copy(from, to)?)
  }

  fn rename_file(&self, from: &Path, to: &Path) -> Result<(), ExecuteError> {
    Ok(files::rename(from, to)?)
  }

  fn append_to_file(&self, path: &Path, content: &[u8]) -> Result<(), ExecuteError> {
    Ok(files::append(path, content)?)
  }

  fn remove(&self, path: &Path) -> Result<(), ExecuteError> {
    Ok(files::remove(path)?)
  }

  fn remove_all(&self, path: &Path) -> Result<(), ExecuteError> {
    Ok(files::remove_all(path)?)
  }

  fn open_file(&self, path: &Path) -> Result<Box<dyn FileWriter>, ExecuteError> {
    Ok(Box::new(files::open(path)?))
  }

  fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), ExecuteError> {
    Ok(files::write(path, content)?)
  }

  fn write_file_with_mode(&self, path: &Path, content: &[u8], mode: u32) -> Result<(), ExecuteError> {
    Ok(files::write_with_mode(path, content, mode)?)
  }

  fn mkdir_all(&self, path: &Path) -> Result<(), ExecuteError> {
    Ok(files::mkdir_all(path)?)
  }

  async fn download_with_cache(&self, request: &DownloadRequest) -> Result<(), ExecuteError> {
    Ok(self.downloader.download_with_cache(request).await?)
  }

  async fn download_with_cache_and_extract(
    &self,
    request: &DownloadRequest,
    member: &str,
  ) -> Result<(), ExecuteError> {
    Ok(
      self
        .downloader
        .download_with_cache_and_extract(request, member)
        .await?,
    )
  }

  fn generate_pki(&self, path: &Path, sans: &[String]) -> Result<(), ExecuteError> {
    Ok(self.pki.generate(path, sans)?)
  }
}
