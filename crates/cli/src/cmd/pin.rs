//! Implementation of the `pinsync pin` command.

use anyhow::{Context, Result, bail};
use serde_json::json;

use super::Settings;
use crate::output::{print_info, print_json, print_stat, print_success};

/// Records a pin in the canonical store, as if pinned from a collection.
pub fn cmd_pin(settings: &Settings, url: &str) -> Result<()> {
  let policy = settings.config.policy;
  if policy.is_derived() {
    bail!("The {} policy derives the canonical mapping from live pins; nothing to record", policy);
  }

  let classified = settings.classify_url(url)?;
  let mut store = settings.open_store();
  let changed = store
    .pin(&classified.key, &classified.representation, policy)
    .with_context(|| format!("Failed to update store: {}", settings.store_path.display()))?;

  if settings.output.is_json() {
    return print_json(&json!({
      "key": classified.key,
      "target": classified.representation,
      "changed": changed,
    }));
  }

  if changed {
    print_success(&format!("Pinned {}", classified.representation));
    print_stat("Key", &classified.key);
  } else {
    print_info(&format!(
      "Canonical mapping unchanged for {} (policy: {})",
      classified.key, policy
    ));
  }
  Ok(())
}
