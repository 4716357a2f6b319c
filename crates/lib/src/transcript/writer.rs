use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use super::{TranscriptSink, render};
use crate::files::FileWriter;

/// Stand-in for an opened file while simulating.
///
/// Bytes written are buffered in memory. Closing emits a single write-file
/// entry for the accumulated content, identical to what
/// [`render::write_file`] produces for the same bytes. Later closes are
/// no-ops, and dropping an unclosed writer closes it.
pub struct TranscriptWriter {
  path: PathBuf,
  buf: Vec<u8>,
  sink: Arc<dyn TranscriptSink>,
  closed: bool,
}

impl TranscriptWriter {
  pub fn new(path: impl Into<PathBuf>, sink: Arc<dyn TranscriptSink>) -> Self {
    Self {
      path: path.into(),
      buf: Vec::new(),
      sink,
      closed: false,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Write for TranscriptWriter {
  fn write(&mut self, data: &[u8]) -> io::Result<usize> {
    if self.closed {
      return Err(io::Error::other(format!(
        "write to closed transcript writer for {}",
        self.path.display()
      )));
    }
    self.buf.extend_from_slice(data);
    Ok(data.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl FileWriter for TranscriptWriter {
  fn close(&mut self) -> io::Result<()> {
    if self.closed {
      return Ok(());
    }
    self.closed = true;
    let content = std::mem::take(&mut self.buf);
    self.sink.emit(&render::write_file(&self.path, &content))
  }
}

impl Drop for TranscriptWriter {
  fn drop(&mut self) {
    if !self.closed
      && let Err(err) = self.close()
    {
      warn!(path = %self.path.display(), error = %err, "failed to emit transcript on drop");
    }
  }
}
