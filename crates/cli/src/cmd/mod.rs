mod pin;
mod plan;
mod status;
mod sync;
mod unpin;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tokio::sync::Mutex;

use pinsync_lib::canonical::{CanonicalStore, JsonFileKv};
use pinsync_lib::config::SyncConfig;
use pinsync_lib::identity::Classified;
use pinsync_lib::platform::paths;

use crate::output::OutputFormat;

pub use pin::cmd_pin;
pub use plan::cmd_plan;
pub use status::cmd_status;
pub use sync::cmd_sync;
pub use unpin::cmd_unpin;
pub use watch::cmd_watch;

/// Resolved global options shared by every command.
pub struct Settings {
  pub config: SyncConfig,
  pub config_path: PathBuf,
  pub store_path: PathBuf,
  pub output: OutputFormat,
}

impl Settings {
  /// Loads the configuration and resolves the store location.
  ///
  /// An explicit `--config` must exist; the default location may be missing.
  pub fn load(config: Option<PathBuf>, store: Option<PathBuf>, output: OutputFormat) -> Result<Self> {
    let config_path = match config {
      Some(path) => {
        if !path.exists() {
          bail!("Config file not found: {}", path.display());
        }
        path
      }
      None => paths::config_file(),
    };

    let config = SyncConfig::load(&config_path)
      .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    Ok(Self {
      config,
      config_path,
      store_path: store.unwrap_or_else(paths::store_file),
      output,
    })
  }

  pub fn open_store(&self) -> CanonicalStore<JsonFileKv> {
    CanonicalStore::new(JsonFileKv::new(self.store_path.clone()))
  }

  pub fn shared_store(&self) -> Mutex<CanonicalStore<JsonFileKv>> {
    Mutex::new(self.open_store())
  }

  /// Classifies a URL given on the command line, rejecting unsyncable ones.
  pub fn classify_url(&self, url: &str) -> Result<Classified> {
    match self.config.identity().classify_raw(url) {
      Some(classified) => Ok(classified),
      None => bail!(
        "Not a syncable URL: {} (allowed schemes: {})",
        url,
        self.config.identity.schemes.join(", ")
      ),
    }
  }
}

/// Creates the runtime used by async commands.
fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}

fn require_world(world: &Path) -> Result<()> {
  if !world.exists() {
    bail!("World file not found: {}", world.display());
  }
  Ok(())
}
