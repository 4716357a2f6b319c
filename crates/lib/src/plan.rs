//! Provisioning plans.
//!
//! A plan is an ordered list of [`Operation`]s stored as JSON:
//!
//! ```json
//! {
//!   "steps": [
//!     { "op": "mkdirAll", "path": "/opt/app" },
//!     { "op": "writeFileWithMode", "path": "/opt/app/key", "content": "secret", "mode": "0600" },
//!     { "op": "ensureBinary", "name": "etcd", "source": "https://h/etcd.tar.gz#etcd/etcd" }
//!   ]
//! }
//! ```
//!
//! Running a plan replays every step through a [`Session`], so the same plan
//! either provisions for real or prints a transcript depending on the
//! session's mode. Execution stops at the first failing step.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::FILE_MODE;
use crate::execute::ExecuteError;
use crate::session::Session;

#[derive(Debug, Error)]
pub enum PlanError {
  #[error("failed to read plan {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse plan {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("step {index} ({op}) failed: {source}")]
  Step {
    index: usize,
    op: &'static str,
    #[source]
    source: ExecuteError,
  },
}

/// One intended side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
  CreateFile {
    path: PathBuf,
  },
  CopyFile {
    from: PathBuf,
    to: PathBuf,
  },
  RenameFile {
    from: PathBuf,
    to: PathBuf,
  },
  AppendToFile {
    path: PathBuf,
    content: String,
  },
  Remove {
    path: PathBuf,
  },
  RemoveAll {
    path: PathBuf,
  },
  /// Content streamed through an opened file, one chunk per write.
  StreamToFile {
    path: PathBuf,
    chunks: Vec<String>,
  },
  WriteFile {
    path: PathBuf,
    content: String,
  },
  WriteFileWithMode {
    path: PathBuf,
    content: String,
    #[serde(deserialize_with = "deserialize_mode")]
    mode: u32,
  },
  MkdirAll {
    path: PathBuf,
  },
  Download {
    source: String,
    dest: PathBuf,
    #[serde(default = "default_file_mode", deserialize_with = "deserialize_mode")]
    mode: u32,
  },
  GeneratePki {
    path: PathBuf,
    #[serde(default)]
    sans: Vec<String>,
  },
  EnsureBinary {
    name: String,
    source: String,
  },
}

impl Operation {
  /// Short name used in logs and errors.
  pub fn kind(&self) -> &'static str {
    match self {
      Operation::CreateFile { .. } => "createFile",
      Operation::CopyFile { .. } => "copyFile",
      Operation::RenameFile { .. } => "renameFile",
      Operation::AppendToFile { .. } => "appendToFile",
      Operation::Remove { .. } => "remove",
      Operation::RemoveAll { .. } => "removeAll",
      Operation::StreamToFile { .. } => "streamToFile",
      Operation::WriteFile { .. } => "writeFile",
      Operation::WriteFileWithMode { .. } => "writeFileWithMode",
      Operation::MkdirAll { .. } => "mkdirAll",
      Operation::Download { .. } => "download",
      Operation::GeneratePki { .. } => "generatePki",
      Operation::EnsureBinary { .. } => "ensureBinary",
    }
  }

  /// Run this operation through `session`.
  ///
  /// Returns the resolved binary path for `ensureBinary`, `None` otherwise.
  pub async fn run(&self, session: &Session) -> Result<Option<PathBuf>, ExecuteError> {
    match self {
      Operation::CreateFile { path } => session.create_file(path)?,
      Operation::CopyFile { from, to } => session.copy_file(from, to)?,
      Operation::RenameFile { from, to } => session.rename_file(from, to)?,
      Operation::AppendToFile { path, content } => session.append_to_file(path, content.as_bytes())?,
      Operation::Remove { path } => session.remove(path)?,
      Operation::RemoveAll { path } => session.remove_all(path)?,
      Operation::StreamToFile { path, chunks } => {
        let mut writer = session.open_file(path)?;
        for chunk in chunks {
          writer
            .write_all(chunk.as_bytes())
            .map_err(|source| stream_error(path, source))?;
        }
        writer.close().map_err(|source| stream_error(path, source))?;
      }
      Operation::WriteFile { path, content } => session.write_file(path, content.as_bytes())?,
      Operation::WriteFileWithMode { path, content, mode } => {
        session.write_file_with_mode(path, content.as_bytes(), *mode)?
      }
      Operation::MkdirAll { path } => session.mkdir_all(path)?,
      Operation::Download { source, dest, mode } => {
        let options = session.config()?;
        session
          .download_with_cache(&options.cache_dir, source, dest, *mode, options.quiet_pull)
          .await?
      }
      Operation::GeneratePki { path, sans } => session.generate_pki(path, sans)?,
      Operation::EnsureBinary { name, source } => return session.ensure_binary(name, source).await.map(Some),
    }
    Ok(None)
  }
}

fn stream_error(path: &Path, source: std::io::Error) -> ExecuteError {
  ExecuteError::Fs(crate::files::FsError::new("stream", path)(source))
}

/// An ordered list of operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
  pub steps: Vec<Operation>,
}

/// Outcome of a completed plan run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanReport {
  /// Number of steps executed.
  pub steps: usize,
  /// Binaries resolved by `ensureBinary` steps, in order.
  pub binaries: Vec<PathBuf>,
}

impl Plan {
  pub fn load(path: &Path) -> Result<Self, PlanError> {
    let contents = fs::read_to_string(path).map_err(|source| PlanError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&contents).map_err(|source| PlanError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }

  /// Run every step in order, stopping at the first failure.
  pub async fn run(&self, session: &Session) -> Result<PlanReport, PlanError> {
    info!(steps = self.steps.len(), simulate = session.is_simulating(), "running plan");

    let mut report = PlanReport::default();
    for (index, step) in self.steps.iter().enumerate() {
      debug!(index, op = step.kind(), "running step");
      let binary = step.run(session).await.map_err(|source| PlanError::Step {
        index,
        op: step.kind(),
        source,
      })?;
      report.binaries.extend(binary);
      report.steps += 1;
    }

    info!(steps = report.steps, "plan complete");
    Ok(report)
  }
}

fn default_file_mode() -> u32 {
  FILE_MODE
}

/// Accept a mode as a JSON number or an octal string such as `"0750"`.
fn deserialize_mode<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawMode {
    Number(u32),
    Octal(String),
  }

  match RawMode::deserialize(deserializer)? {
    RawMode::Number(mode) => Ok(mode),
    RawMode::Octal(text) => {
      let digits = text.trim_start_matches("0o");
      u32::from_str_radix(digits, 8)
        .map_err(|_| serde::de::Error::custom(format!("invalid octal mode: {}", text)))
    }
  }
}
