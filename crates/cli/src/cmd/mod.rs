mod binary;
mod pki;
mod run;

use std::sync::Arc;

use anyhow::{Context, Result};

use provkit_lib::config::{ConfigFile, ConfigOptions, ConfigProvider};
use provkit_lib::transcript::{FileSink, StdoutSink, TranscriptSink};
use provkit_lib::{Collaborators, Mode, Session, SessionOptions};

use crate::SessionArgs;

pub use binary::cmd_ensure_binary;
pub use pki::cmd_pki;
pub use run::cmd_run;

/// Build a session from command-line flags.
pub(crate) fn open_session(args: &SessionArgs) -> Result<Session> {
  let config: Arc<dyn ConfigProvider> = match &args.config {
    Some(path) => Arc::new(ConfigFile::new(path)),
    None => {
      let file = ConfigFile::default_location();
      if file.path().exists() {
        Arc::new(file)
      } else {
        Arc::new(ConfigOptions::default())
      }
    }
  };

  let transcript: Arc<dyn TranscriptSink> = match &args.transcript {
    Some(path) => Arc::new(
      FileSink::open(path).with_context(|| format!("Failed to open transcript: {}", path.display()))?,
    ),
    None => Arc::new(StdoutSink),
  };

  let options = SessionOptions {
    workdir: args.workdir.clone(),
    mode: Mode {
      simulate: args.dry_run,
      allow_real_download: args.allow_real_download,
    },
  };

  Ok(Session::with_collaborators(
    options,
    Collaborators {
      config,
      transcript,
      ..Collaborators::default()
    },
  ))
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}
