//! Transcript output for simulated operations.
//!
//! A simulated operation is rendered into a shell-like transcript entry (see
//! [`render`]) and handed to a [`TranscriptSink`]. Sinks decide where entries
//! go: stdout, memory, or a script file.

pub mod render;
mod writer;

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

pub use writer::TranscriptWriter;

/// Destination for transcript entries.
///
/// An entry may span several lines (heredocs). Emission failures are reported
/// to the caller, who surfaces them like any other operation error.
pub trait TranscriptSink: Send + Sync {
  fn emit(&self, entry: &str) -> io::Result<()>;
}

impl<T: TranscriptSink + ?Sized> TranscriptSink for Arc<T> {
  fn emit(&self, entry: &str) -> io::Result<()> {
    (**self).emit(entry)
  }
}

/// Writes each entry to stdout followed by a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl TranscriptSink for StdoutSink {
  fn emit(&self, entry: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", entry)?;
    out.flush()
  }
}

/// Collects entries in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
  entries: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Entries emitted so far, in order.
  pub fn entries(&self) -> Vec<String> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// The full transcript, one entry per line.
  pub fn contents(&self) -> String {
    self.entries().join("\n")
  }

  pub fn is_empty(&self) -> bool {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
  }
}

impl TranscriptSink for MemorySink {
  fn emit(&self, entry: &str) -> io::Result<()> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(entry.to_string());
    Ok(())
  }
}

/// Appends entries to a script file.
#[derive(Debug)]
pub struct FileSink {
  file: Mutex<File>,
}

impl FileSink {
  /// Opens `path` for appending, creating it if needed.
  pub fn open(path: &Path) -> io::Result<Self> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Self { file: Mutex::new(file) })
  }
}

impl TranscriptSink for FileSink {
  fn emit(&self, entry: &str) -> io::Result<()> {
    let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(file, "{}", entry)?;
    file.flush()
  }
}
