use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a pin does to an identity key that already has a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinPolicy {
  /// The first target recorded for a key is kept; plans never update content.
  KeepExisting,
  /// Every pin overwrites the key's target; plans retarget stale instances.
  #[default]
  ReplaceWithNewest,
  /// The mapping is the live union of pinned items, recomputed every pass.
  Union,
}

impl PinPolicy {
  /// Whether plans retarget kept instances whose content differs.
  pub fn updates_content(self) -> bool {
    matches!(self, PinPolicy::ReplaceWithNewest)
  }

  /// Whether the mapping is derived from reality instead of persisted.
  pub fn is_derived(self) -> bool {
    matches!(self, PinPolicy::Union)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      PinPolicy::KeepExisting => "keep-existing",
      PinPolicy::ReplaceWithNewest => "replace-with-newest",
      PinPolicy::Union => "union",
    }
  }
}

impl fmt::Display for PinPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Identity key -> target representation. At most one target per key.
///
/// Backed by a `BTreeMap` so iteration is always in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalMap(BTreeMap<String, String>);

impl CanonicalMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.0.get(key).map(String::as_str)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  /// Entries in sorted key order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn insert(&mut self, key: impl Into<String>, target: impl Into<String>) -> Option<String> {
    self.0.insert(key.into(), target.into())
  }

  /// Inserts only if `key` is absent. Returns whether it was inserted.
  pub fn insert_if_absent(&mut self, key: &str, target: &str) -> bool {
    if self.0.contains_key(key) {
      return false;
    }
    self.0.insert(key.to_string(), target.to_string());
    true
  }

  pub fn remove(&mut self, key: &str) -> Option<String> {
    self.0.remove(key)
  }

  /// Applies a pin transition. Returns whether the mapping changed.
  ///
  /// The union policy never records pins; its mapping is derived.
  pub fn apply_pin(&mut self, key: &str, target: &str, policy: PinPolicy) -> bool {
    match policy {
      PinPolicy::KeepExisting => self.insert_if_absent(key, target),
      PinPolicy::ReplaceWithNewest => self.insert(key, target).as_deref() != Some(target),
      PinPolicy::Union => false,
    }
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CanonicalMap {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

/// Errors that can occur when loading or saving the canonical mapping.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to read store {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write store {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create store directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to parse store {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("store {0} does not contain a JSON object")]
  NotAnObject(PathBuf),

  #[error("malformed value under key {key}: {source}")]
  Malformed {
    key: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize store: {0}")]
  Serialize(#[source] serde_json::Error),
}
