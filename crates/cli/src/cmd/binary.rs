//! Implementation of the `provkit ensure-binary` command.

use anyhow::{Context, Result};

use super::{open_session, runtime};
use crate::SessionArgs;

/// Resolve binary `name` from `source` and print its path on stdout.
pub fn cmd_ensure_binary(name: &str, source: &str, args: &SessionArgs) -> Result<()> {
  let session = open_session(args)?;

  let rt = runtime()?;
  let path = rt
    .block_on(session.ensure_binary(name, source))
    .with_context(|| format!("Failed to ensure binary: {}", name))?;

  println!("{}", path.display());
  Ok(())
}
