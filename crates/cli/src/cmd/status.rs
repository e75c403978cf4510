//! Status command implementation.
//!
//! Displays the effective configuration and the canonical mapping.

use anyhow::{Context, Result};
use serde_json::json;

use crate::output::{self, print_info, print_json, print_stat};

use super::Settings;

pub fn cmd_status(settings: &Settings, verbose: bool) -> Result<()> {
  let config = &settings.config;
  let mapping = settings
    .open_store()
    .peek()
    .with_context(|| format!("Failed to read store: {}", settings.store_path.display()))?
    .unwrap_or_default();

  if settings.output.is_json() {
    return print_json(&json!({
      "policy": config.policy,
      "identity": config.identity,
      "config": settings.config_path,
      "store": settings.store_path,
      "entries": mapping,
    }));
  }

  print_stat("Policy", config.policy.as_str());
  print_stat("Identity", config.identity.mode.as_str());
  print_stat("Config", &settings.config_path.display().to_string());
  print_stat("Store", &settings.store_path.display().to_string());

  if verbose {
    let timing = &config.timing;
    print_stat(
      "Suppression window",
      &humantime::format_duration(timing.suppression_window).to_string(),
    );
    print_stat(
      "Unpin confirmation",
      &humantime::format_duration(timing.unpin_confirm_delay).to_string(),
    );
    if !config.identity.grouped_hosts.is_empty() {
      print_stat("Grouped hosts", &config.identity.grouped_hosts.join(", "));
    }
  }

  println!();
  if config.policy.is_derived() {
    print_info("Canonical mapping is derived from live pins on every pass");
    return Ok(());
  }
  if mapping.is_empty() {
    print_info("No canonical pins. Run 'pinsync sync' to seed from pinned items.");
    return Ok(());
  }

  println!("Canonical pins ({}):", mapping.len());
  for (key, target) in mapping.iter() {
    if key == target {
      println!("  {} {}", output::symbols::INFO, target);
    } else {
      println!("  {} {} {} {}", output::symbols::INFO, key, output::symbols::ARROW, target);
    }
  }
  Ok(())
}
