//! Real filesystem operations used in apply mode.
//!
//! Parent directories are created on demand with [`DIR_MODE`]; files written
//! without an explicit mode get [`FILE_MODE`]. Every failure carries the
//! operation and the path it was applied to.

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{DIR_MODE, FILE_MODE};

/// A filesystem operation failed.
#[derive(Debug, Error)]
#[error("{op} {}: {source}", describe(.path, .dest.as_deref()))]
pub struct FsError {
  /// Operation that failed, e.g. `"copy"`.
  pub op: &'static str,
  /// Path the operation was applied to; the source for two-path operations.
  pub path: PathBuf,
  /// Destination of a copy or rename.
  pub dest: Option<PathBuf>,
  #[source]
  pub source: io::Error,
}

impl FsError {
  pub(crate) fn new(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> FsError {
    let path = path.to_path_buf();
    move |source| FsError {
      op,
      path,
      dest: None,
      source,
    }
  }

  fn between(op: &'static str, from: &Path, to: &Path) -> impl FnOnce(io::Error) -> FsError {
    let path = from.to_path_buf();
    let dest = to.to_path_buf();
    move |source| FsError {
      op,
      path,
      dest: Some(dest),
      source,
    }
  }
}

fn describe(path: &Path, dest: Option<&Path>) -> String {
  match dest {
    Some(dest) => format!("{} -> {}", path.display(), dest.display()),
    None => path.display().to_string(),
  }
}

/// A writable stream that must be closed explicitly.
///
/// `close` is idempotent.
pub trait FileWriter: Write + Send {
  fn close(&mut self) -> io::Result<()>;
}

/// A file opened for writing on disk.
pub struct DiskWriter {
  path: PathBuf,
  inner: Option<BufWriter<File>>,
}

impl DiskWriter {
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Write for DiskWriter {
  fn write(&mut self, data: &[u8]) -> io::Result<usize> {
    match self.inner.as_mut() {
      Some(inner) => inner.write(data),
      None => Err(io::Error::other(format!("write to closed file {}", self.path.display()))),
    }
  }

  fn flush(&mut self) -> io::Result<()> {
    match self.inner.as_mut() {
      Some(inner) => inner.flush(),
      None => Ok(()),
    }
  }
}

impl FileWriter for DiskWriter {
  fn close(&mut self) -> io::Result<()> {
    match self.inner.take() {
      Some(mut inner) => inner.flush(),
      None => Ok(()),
    }
  }
}

/// Create a directory and all its parents.
pub fn mkdir_all(path: &Path) -> Result<(), FsError> {
  debug!(path = %path.display(), "mkdir");
  dir_builder().create(path).map_err(FsError::new("mkdir", path))
}

/// Create an empty file, truncating an existing one.
pub fn create(path: &Path) -> Result<(), FsError> {
  ensure_parent(path)?;
  open_with_mode(path, FILE_MODE, false)
    .map(drop)
    .map_err(FsError::new("create", path))
}

/// Copy `from` to `to`, preserving permissions.
pub fn copy(from: &Path, to: &Path) -> Result<(), FsError> {
  ensure_parent(to)?;
  fs::copy(from, to).map_err(FsError::between("copy", from, to))?;
  Ok(())
}

pub fn rename(from: &Path, to: &Path) -> Result<(), FsError> {
  fs::rename(from, to).map_err(FsError::between("rename", from, to))
}

/// Append `content`, creating the file if it does not exist.
pub fn append(path: &Path, content: &[u8]) -> Result<(), FsError> {
  ensure_parent(path)?;
  let mut file = open_with_mode(path, FILE_MODE, true).map_err(FsError::new("append", path))?;
  file.write_all(content).map_err(FsError::new("append", path))
}

pub fn remove(path: &Path) -> Result<(), FsError> {
  fs::remove_file(path).map_err(FsError::new("remove", path))
}

/// Remove a directory tree. A missing path is not an error.
pub fn remove_all(path: &Path) -> Result<(), FsError> {
  let result = match fs::symlink_metadata(path) {
    Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
    Ok(_) => fs::remove_file(path),
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(err) => Err(err),
  };
  result.map_err(FsError::new("remove all", path))
}

/// Open a file for writing, truncating it.
pub fn open(path: &Path) -> Result<DiskWriter, FsError> {
  ensure_parent(path)?;
  let file = open_with_mode(path, FILE_MODE, false).map_err(FsError::new("open", path))?;
  Ok(DiskWriter {
    path: path.to_path_buf(),
    inner: Some(BufWriter::new(file)),
  })
}

/// Write `content`, truncating an existing file.
///
/// New files get [`FILE_MODE`]; an existing file keeps its permission bits.
pub fn write(path: &Path, content: &[u8]) -> Result<(), FsError> {
  ensure_parent(path)?;
  let mut file = open_with_mode(path, FILE_MODE, false).map_err(FsError::new("write", path))?;
  file.write_all(content).map_err(FsError::new("write", path))
}

/// Write `content` and set the file's permission bits to `mode`.
pub fn write_with_mode(path: &Path, content: &[u8], mode: u32) -> Result<(), FsError> {
  ensure_parent(path)?;
  let mut file = open_with_mode(path, mode, false).map_err(FsError::new("write", path))?;
  file.write_all(content).map_err(FsError::new("write", path))?;
  set_mode(path, mode).map_err(FsError::new("chmod", path))
}

/// Set permission bits. A no-op where the platform has no mode bits.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
  Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), FsError> {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => mkdir_all(parent),
    _ => Ok(()),
  }
}

fn dir_builder() -> DirBuilder {
  let mut builder = DirBuilder::new();
  builder.recursive(true);
  #[cfg(unix)]
  {
    use std::os::unix::fs::DirBuilderExt;
    builder.mode(DIR_MODE);
  }
  builder
}

fn open_with_mode(path: &Path, mode: u32, append: bool) -> io::Result<File> {
  let mut options = OpenOptions::new();
  options.create(true);
  if append {
    options.append(true);
  } else {
    options.write(true).truncate(true);
  }
  #[cfg(unix)]
  {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(mode);
  }
  #[cfg(not(unix))]
  let _ = mode;
  options.open(path)
}
