//! Single-member archive extraction.
//!
//! Supports:
//! - `.tar.gz` / `.tgz`
//! - `.tar`
//! - `.zip`

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tar::Archive;

use super::DownloadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
  TarGz,
  Tar,
  Zip,
}

impl ArchiveKind {
  /// Detect the archive format from a file name or URL.
  pub fn detect(name: &str) -> Result<Self, DownloadError> {
    let name = name.split(['?', '#']).next().unwrap_or(name);
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
      Ok(Self::TarGz)
    } else if name.ends_with(".tar") {
      Ok(Self::Tar)
    } else if name.ends_with(".zip") {
      Ok(Self::Zip)
    } else {
      Err(DownloadError::UnsupportedArchive(name.to_string()))
    }
  }
}

/// Copy the bytes of `member` inside `archive` into `out`.
pub fn extract_member(archive: &Path, kind: ArchiveKind, member: &str, out: &mut impl Write) -> Result<(), DownloadError> {
  let file = File::open(archive).map_err(DownloadError::io(archive))?;
  let reader = BufReader::new(file);
  let found = match kind {
    ArchiveKind::TarGz => copy_tar_member(GzDecoder::new(reader), archive, member, out)?,
    ArchiveKind::Tar => copy_tar_member(reader, archive, member, out)?,
    ArchiveKind::Zip => copy_zip_member(reader, archive, member, out)?,
  };

  if found {
    Ok(())
  } else {
    Err(DownloadError::MemberNotFound {
      archive: archive.display().to_string(),
      member: member.to_string(),
    })
  }
}

fn copy_tar_member(reader: impl Read, archive: &Path, member: &str, out: &mut impl Write) -> Result<bool, DownloadError> {
  let corrupt = |err: io::Error| DownloadError::Archive {
    archive: archive.display().to_string(),
    message: err.to_string(),
  };

  let mut tar = Archive::new(reader);
  for entry in tar.entries().map_err(corrupt)? {
    let mut entry = entry.map_err(corrupt)?;
    let matches = entry.header().entry_type().is_file() && same_member(&entry.path().map_err(corrupt)?, member);
    if !matches {
      continue;
    }
    io::copy(&mut entry, out).map_err(corrupt)?;
    return Ok(true);
  }
  Ok(false)
}

fn copy_zip_member(
  reader: BufReader<File>,
  archive: &Path,
  member: &str,
  out: &mut impl Write,
) -> Result<bool, DownloadError> {
  let corrupt = |message: String| DownloadError::Archive {
    archive: archive.display().to_string(),
    message,
  };

  let mut zip = zip::ZipArchive::new(reader).map_err(|e| corrupt(e.to_string()))?;
  for i in 0..zip.len() {
    let mut file = zip.by_index(i).map_err(|e| corrupt(e.to_string()))?;
    if file.is_dir() {
      continue;
    }
    let matches = file.enclosed_name().is_some_and(|name| same_member(&name, member));
    if matches {
      io::copy(&mut file, out).map_err(|e| corrupt(e.to_string()))?;
      return Ok(true);
    }
  }
  Ok(false)
}

/// Compare an archive entry path with a requested member, ignoring `./`.
fn same_member(entry: &Path, member: &str) -> bool {
  let normal = |path: &Path| -> Vec<String> {
    path
      .components()
      .filter_map(|c| match c {
        Component::Normal(s) => Some(s.to_string_lossy().to_string()),
        _ => None,
      })
      .collect()
  };
  let wanted = normal(Path::new(member));
  !wanted.is_empty() && normal(entry) == wanted
}
