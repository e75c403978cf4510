//! Implementation of the `pinsync unpin` command.

use anyhow::{Context, Result, bail};
use serde_json::json;

use super::Settings;
use crate::output::{print_info, print_json, print_success};

/// Removes the identity key of `url` from the canonical store.
///
/// The next sync removes the matching items from every collection.
pub fn cmd_unpin(settings: &Settings, url: &str) -> Result<()> {
  let policy = settings.config.policy;
  if policy.is_derived() {
    bail!("The {} policy derives the canonical mapping from live pins; nothing to remove", policy);
  }

  let classified = settings.classify_url(url)?;
  let mut store = settings.open_store();
  let removed = store
    .unpin(&classified.key)
    .with_context(|| format!("Failed to update store: {}", settings.store_path.display()))?;

  if settings.output.is_json() {
    return print_json(&json!({ "key": classified.key, "removed": removed }));
  }

  if removed {
    print_success(&format!("Unpinned {}", classified.key));
  } else {
    print_info(&format!("{} is not in the canonical mapping", classified.key));
  }
  Ok(())
}
