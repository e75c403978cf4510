//! Implementation of the `pinsync plan` command.
//!
//! Computes the plan of every collection in a world file against the
//! canonical mapping and prints it. Nothing is mutated.

use std::path::Path;

use anyhow::{Context, Result};

use pinsync_lib::host::FileHost;
use pinsync_lib::sync::{PassContext, preview_pass};

use super::{Settings, require_world, runtime};
use crate::output::{plural, print_json, print_plans, print_success};

pub fn cmd_plan(settings: &Settings, world: &Path) -> Result<()> {
  require_world(world)?;

  let host = FileHost::new(world.to_path_buf());
  let store = settings.shared_store();
  let ctx = PassContext::from_config(&settings.config);

  let plans = runtime()?
    .block_on(preview_pass(&host, &store, &ctx))
    .context("Failed to compute plan")?;

  if settings.output.is_json() {
    return print_json(&plans);
  }

  let total = print_plans(&plans);
  if total == 0 {
    print_success("All collections are in sync");
  } else {
    println!();
    println!("Plan: {} in {}", plural(total, "action"), plural(plans.len(), "collection"));
  }
  Ok(())
}
