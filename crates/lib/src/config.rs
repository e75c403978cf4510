//! Configuration for the sync engine.
//!
//! Loaded from a TOML file. Every field has a default, so a missing file or
//! an empty one yields a working configuration.
//!
//! # Example
//!
//! ```toml
//! policy = "replace-with-newest"
//!
//! [identity]
//! mode = "selective"
//! grouped_hosts = ["mail.example.com", "*.chat.example.com"]
//! schemes = ["http", "https"]
//!
//! [timing]
//! suppression_window = "1500ms"
//! unpin_confirm_delay = "200ms"
//!
//! [timing.debounce]
//! collection_created = "600ms"
//! pin_changed = "250ms"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::canonical::PinPolicy;
use crate::identity::{DEFAULT_SCHEMES, HostPattern, Identity, IdentityPolicy};
use crate::sync::Trigger;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

/// Identity grouping mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityMode {
  #[default]
  Exact,
  Grouped,
  Selective,
}

impl IdentityMode {
  pub fn as_str(self) -> &'static str {
    match self {
      IdentityMode::Exact => "exact",
      IdentityMode::Grouped => "grouped",
      IdentityMode::Selective => "selective",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
  pub mode: IdentityMode,
  /// Host patterns grouped by origin when `mode` is `selective`.
  pub grouped_hosts: Vec<String>,
  /// Allowed URL schemes.
  pub schemes: Vec<String>,
}

impl Default for IdentityConfig {
  fn default() -> Self {
    Self {
      mode: IdentityMode::default(),
      grouped_hosts: Vec::new(),
      schemes: DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect(),
    }
  }
}

/// Debounce delay per trigger source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
  #[serde(with = "duration_str")]
  pub install: Duration,
  #[serde(with = "duration_str")]
  pub startup: Duration,
  #[serde(with = "duration_str")]
  pub collection_created: Duration,
  #[serde(with = "duration_str")]
  pub pin_changed: Duration,
  #[serde(with = "duration_str")]
  pub item_created: Duration,
  #[serde(with = "duration_str")]
  pub manual: Duration,
}

impl Default for DebounceConfig {
  fn default() -> Self {
    Self {
      install: Duration::ZERO,
      startup: Duration::ZERO,
      collection_created: Duration::from_millis(600),
      pin_changed: Duration::from_millis(250),
      item_created: Duration::from_millis(400),
      manual: Duration::ZERO,
    }
  }
}

impl DebounceConfig {
  pub fn delay_for(&self, trigger: Trigger) -> Duration {
    match trigger {
      Trigger::Install => self.install,
      Trigger::Startup => self.startup,
      Trigger::CollectionCreated => self.collection_created,
      Trigger::PinChanged => self.pin_changed,
      Trigger::ItemCreated => self.item_created,
      Trigger::Manual => self.manual,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
  /// How long pin/unpin/creation events are ignored after the loop mutates
  /// a collection. Heuristic only: a batch outliving the window lets its own
  /// events through.
  #[serde(with = "duration_str")]
  pub suppression_window: Duration,

  /// Delay before an unpin is confirmed by re-querying the instance.
  #[serde(with = "duration_str")]
  pub unpin_confirm_delay: Duration,

  pub debounce: DebounceConfig,
}

impl Default for TimingConfig {
  fn default() -> Self {
    Self {
      suppression_window: Duration::from_millis(1500),
      unpin_confirm_delay: Duration::from_millis(200),
      debounce: DebounceConfig::default(),
    }
  }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  pub policy: PinPolicy,
  pub identity: IdentityConfig,
  pub timing: TimingConfig,
}

impl SyncConfig {
  /// Load configuration from a TOML file.
  ///
  /// Returns the default configuration if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Self::default());
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Builds the identity rules described by `[identity]`.
  pub fn identity(&self) -> Identity {
    let policy = match self.identity.mode {
      IdentityMode::Exact => IdentityPolicy::Exact,
      IdentityMode::Grouped => IdentityPolicy::Grouped,
      IdentityMode::Selective => {
        IdentityPolicy::Selective(self.identity.grouped_hosts.iter().map(|p| HostPattern::parse(p)).collect())
      }
    };
    Identity::new(policy).with_schemes(&self.identity.schemes)
  }
}

/// Serde adapter for human-readable durations such as `"1500ms"` or `"2s"`.
mod duration_str {
  use std::time::Duration;

  use serde::{Deserialize, Deserializer, Serializer, de};

  pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(de::Error::custom)
  }
}
