//! Source descriptors and source kinds.

use std::path::PathBuf;

use super::DownloadError;

/// A source descriptor split into its fetch location and optional archive member.
///
/// `SOURCE#MEMBER` names `MEMBER` inside the archive at `SOURCE`. Only the
/// first `#` splits; anything after it belongs to the member path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDescriptor<'a> {
  pub location: &'a str,
  pub member: Option<&'a str>,
}

impl<'a> SourceDescriptor<'a> {
  pub fn parse(source: &'a str) -> Self {
    match source.split_once('#') {
      Some((location, member)) => Self {
        location,
        member: Some(member),
      },
      None => Self {
        location: source,
        member: None,
      },
    }
  }
}

/// Where the bytes of a source come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  /// `http://` or `https://` URL, cached.
  Remote(String),
  /// `file://` URL or plain path, read in place.
  Local(PathBuf),
}

impl Source {
  pub fn classify(location: &str) -> Result<Self, DownloadError> {
    if location.is_empty() {
      return Err(DownloadError::EmptySource);
    }
    if location.starts_with("http://") || location.starts_with("https://") {
      return Ok(Self::Remote(location.to_string()));
    }
    if let Some(path) = location.strip_prefix("file://") {
      return Ok(Self::Local(PathBuf::from(path)));
    }
    if location.contains("://") {
      return Err(DownloadError::UnsupportedSource(location.to_string()));
    }
    Ok(Self::Local(PathBuf::from(location)))
  }
}
