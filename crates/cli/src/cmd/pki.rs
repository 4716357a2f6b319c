//! Implementation of the `provkit pki` command.

use std::path::Path;

use anyhow::{Context, Result};

use super::open_session;
use crate::SessionArgs;
use crate::output::print_success;

pub fn cmd_pki(path: &Path, sans: &[String], args: &SessionArgs) -> Result<()> {
  let session = open_session(args)?;

  session
    .generate_pki(path, sans)
    .with_context(|| format!("Failed to generate PKI: {}", path.display()))?;

  if !session.is_simulating() {
    print_success(&format!("PKI written to {}", path.display()));
  }
  Ok(())
}
