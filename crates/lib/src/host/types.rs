//! Identifiers, item descriptors and errors shared by every host.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies a collection (a browser window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub u64);

impl fmt::Display for CollectionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Identifies one instance (a tab) inside a collection.
///
/// Unique within its collection and stable for the instance's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Raw description of an instance as reported by the host.
///
/// `committed` is the target the instance currently shows; `pending` is the
/// destination of an in-flight navigation, which is often the only thing
/// known about a freshly created instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
  pub id: InstanceId,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub committed: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pending: Option<String>,

  #[serde(default)]
  pub pinned: bool,
}

impl ItemDescriptor {
  /// A pinned instance whose committed target is `url`.
  pub fn pinned_at(id: u64, url: &str) -> Self {
    Self {
      id: InstanceId(id),
      committed: Some(url.to_string()),
      pending: None,
      pinned: true,
    }
  }

  /// A pinned instance that has not committed yet and is navigating to `url`.
  pub fn pinned_pending(id: u64, url: &str) -> Self {
    Self {
      id: InstanceId(id),
      committed: None,
      pending: Some(url.to_string()),
      pinned: true,
    }
  }

  /// An unpinned instance whose committed target is `url`.
  pub fn unpinned_at(id: u64, url: &str) -> Self {
    Self {
      pinned: false,
      ..Self::pinned_at(id, url)
    }
  }
}

/// Errors reported by a host's enumeration and mutation primitives.
#[derive(Debug, Error)]
pub enum HostError {
  #[error("collection not found: {0}")]
  CollectionNotFound(CollectionId),

  #[error("instance not found: {0}")]
  InstanceNotFound(InstanceId),

  #[error("host rejected {operation} in collection {collection}")]
  Rejected {
    operation: &'static str,
    collection: CollectionId,
  },

  #[error("instance ids exhausted")]
  IdsExhausted,

  #[error("host task failed: {0}")]
  Task(String),

  #[error("failed to read world file: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write world file: {0}")]
  Write(#[source] io::Error),

  #[error("failed to parse world file: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize world: {0}")]
  Serialize(#[source] serde_json::Error),
}
