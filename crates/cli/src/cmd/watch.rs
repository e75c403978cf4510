//! Implementation of the `pinsync watch` command.
//!
//! Runs the convergence engine against a world file. Host events are read
//! from stdin, one JSON object per line:
//!
//! ```text
//! {"event": "startup"}
//! {"event": "pin-changed", "instance": 12, "pinned": true}
//! force
//! ```
//!
//! `force` requests a manual reconcile and prints its result. End of input
//! stops the engine after pending unpins are confirmed and any scheduled
//! pass has run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use pinsync_lib::config::SyncConfig;
use pinsync_lib::host::FileHost;
use pinsync_lib::sync::{HostEvent, SyncEngine, SyncHandle};

use super::{Settings, require_world, runtime};
use crate::output::{OutputFormat, print_error, print_json, print_report, print_warning};

const FORCE_COMMAND: &str = "force";

pub fn cmd_watch(settings: &Settings, world: &Path, suppression_window: Option<Duration>) -> Result<()> {
  require_world(world)?;

  let mut config: SyncConfig = settings.config.clone();
  if let Some(window) = suppression_window {
    config.timing.suppression_window = window;
  }

  let host = Arc::new(FileHost::new(world.to_path_buf()));
  let store = Arc::new(settings.shared_store());

  runtime()?.block_on(async move {
    let handle = SyncEngine::spawn(host, store, config);
    info!(world = %world.display(), "watching for host events on stdin");
    let result = read_events(&handle, settings.output).await;
    handle.shutdown().await.context("Sync engine stopped unexpectedly")?;
    result
  })
}

async fn read_events(handle: &SyncHandle, output: OutputFormat) -> Result<()> {
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }

    if line == FORCE_COMMAND {
      match handle.force_reconcile().await {
        Ok(report) if output.is_json() => print_json(&report)?,
        Ok(report) => print_report(&report),
        Err(e) => print_error(&format!("Reconcile failed: {}", e)),
      }
      continue;
    }

    match serde_json::from_str::<HostEvent>(line) {
      Ok(event) => handle.notify(event).await.context("Sync engine stopped")?,
      Err(e) => print_warning(&format!("Ignoring malformed event {:?}: {}", line, e)),
    }
  }
  Ok(())
}
