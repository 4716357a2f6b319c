use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{ExecuteError, Executor};
use crate::download::{DownloadRequest, Downloader};
use crate::files::FileWriter;
use crate::transcript::{TranscriptSink, TranscriptWriter, render};

/// Renders operations to a transcript instead of performing them.
///
/// Downloads are the one exception: when built with
/// [`with_real_downloads`](Self::with_real_downloads), downloads are handed to
/// the real downloader so later steps can rely on the artifacts.
pub struct SimulatingExecutor {
  sink: Arc<dyn TranscriptSink>,
  downloader: Option<Arc<dyn Downloader>>,
}

impl SimulatingExecutor {
  pub fn new(sink: Arc<dyn TranscriptSink>) -> Self {
    Self { sink, downloader: None }
  }

  pub fn with_real_downloads(mut self, downloader: Arc<dyn Downloader>) -> Self {
    self.downloader = Some(downloader);
    self
  }

  fn emit(&self, entry: String) -> Result<(), ExecuteError> {
    self.sink.emit(&entry).map_err(ExecuteError::Transcript)
  }
}

#[async_trait]
impl Executor for SimulatingExecutor {
  fn create_file(&self, path: &Path) -> Result<(), ExecuteError> {
    self.emit(render::create_file(path))
  }

  fn copy_file(&self, from: &Path, to: &Path) -> Result<(), ExecuteError> {
    self.emit(render::copy_file(from, to))
  }

  fn rename_file(&self, from: &Path, to: &Path) -> Result<(), ExecuteError> {
    self.emit(render::rename_file(from, to))
  }

  fn append_to_file(&self, path: &Path, content: &[u8]) -> Result<(), ExecuteError> {
    self.emit(render::append_to_file(path, content))
  }

  fn remove(&self, path: &Path) -> Result<(), ExecuteError> {
    self.emit(render::remove(path))
  }

  fn remove_all(&self, path: &Path) -> Result<(), ExecuteError> {
    self.emit(render::remove_all(path))
  }

  fn open_file(&self, path: &Path) -> Result<Box<dyn FileWriter>, ExecuteError> {
    Ok(Box::new(TranscriptWriter::new(path, Arc::clone(&self.sink))))
  }

  fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), ExecuteError> {
    self.emit(render::write_file(path, content))
  }

  fn write_file_with_mode(&self, path: &Path, content: &[u8], mode: u32) -> Result<(), ExecuteError> {
    self.emit(render::write_file_with_mode(path, content, mode))
  }

  fn mkdir_all(&self, path: &Path) -> Result<(), ExecuteError> {
    self.emit(render::mkdir_all(path))
  }

  async fn download_with_cache(&self, request: &DownloadRequest) -> Result<(), ExecuteError> {
    match &self.downloader {
      Some(downloader) => {
        debug!(source = %request.source, "real download while simulating");
        Ok(downloader.download_with_cache(request).await?)
      }
      None => self.emit(render::download(&request.source, &request.dest)),
    }
  }

  async fn download_with_cache_and_extract(
    &self,
    request: &DownloadRequest,
    member: &str,
  ) -> Result<(), ExecuteError> {
    match &self.downloader {
      Some(downloader) => {
        debug!(source = %request.source, member, "real download while simulating");
        Ok(downloader.download_with_cache_and_extract(request, member).await?)
      }
      None => self.emit(render::download_and_extract(&request.source, member, &request.dest)),
    }
  }

  fn generate_pki(&self, path: &Path, _sans: &[String]) -> Result<(), ExecuteError> {
    self.emit(render::generate_pki(path))
  }
}
