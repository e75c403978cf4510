//! Implementation of the `pinsync sync` command.

use std::path::Path;

use anyhow::{Context, Result};

use pinsync_lib::host::FileHost;
use pinsync_lib::sync::{PassContext, run_pass};

use super::{Settings, require_world, runtime};
use crate::output::{print_json, print_report};

/// Runs one reconciliation pass against a world file.
///
/// Fails only if the pass itself fails (enumeration or store errors).
/// Individual action failures are reported and do not change the exit code.
pub fn cmd_sync(settings: &Settings, world: &Path) -> Result<()> {
  require_world(world)?;

  let host = FileHost::new(world.to_path_buf());
  let store = settings.shared_store();
  let ctx = PassContext::from_config(&settings.config);

  let report = runtime()?
    .block_on(run_pass(&host, &store, &ctx))
    .context("Reconciliation pass failed")?;

  if settings.output.is_json() {
    print_json(&report)
  } else {
    print_report(&report);
    Ok(())
  }
}
