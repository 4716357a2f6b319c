//! Implementation of the `provkit run` command.
//!
//! Loads a JSON plan and replays it through a session. With `--dry-run` the
//! steps are written to the transcript instead of the filesystem.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use provkit_lib::Plan;

use super::{open_session, runtime};
use crate::SessionArgs;
use crate::output::{print_stat, print_success};

pub fn cmd_run(plan_path: &Path, args: &SessionArgs) -> Result<()> {
  let plan = Plan::load(plan_path)?;
  let session = open_session(args)?;

  info!(plan = %plan_path.display(), steps = plan.steps.len(), "loaded plan");

  let rt = runtime()?;
  let report = rt.block_on(plan.run(&session)).context("Plan failed")?;

  // Dry runs keep stdout for the transcript.
  if session.is_simulating() {
    return Ok(());
  }

  print_success("Plan complete");
  print_stat("Steps", &report.steps.to_string());
  for binary in &report.binaries {
    print_stat("Binary", &binary.display().to_string());
  }
  Ok(())
}
