//! Events, triggers, reports and errors of the convergence loop.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canonical::StoreError;
use crate::host::{CollectionId, HostError, InstanceId};

/// A notification delivered by the host.
///
/// Serialized with an `event` tag, one object per event:
///
/// ```json
/// {"event": "pin-changed", "instance": 12, "pinned": false}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum HostEvent {
  /// The engine was installed or upgraded.
  Installed,
  /// The host process started or resumed.
  Startup,
  CollectionCreated { collection: CollectionId },
  PinChanged { instance: InstanceId, pinned: bool },
  ItemCreated { instance: InstanceId },
}

impl HostEvent {
  pub fn trigger(&self) -> Trigger {
    match self {
      HostEvent::Installed => Trigger::Install,
      HostEvent::Startup => Trigger::Startup,
      HostEvent::CollectionCreated { .. } => Trigger::CollectionCreated,
      HostEvent::PinChanged { .. } => Trigger::PinChanged,
      HostEvent::ItemCreated { .. } => Trigger::ItemCreated,
    }
  }
}

/// Named source of a reconcile request. Each has its own debounce delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
  Install,
  Startup,
  CollectionCreated,
  PinChanged,
  ItemCreated,
  Manual,
}

impl Trigger {
  pub fn as_str(self) -> &'static str {
    match self {
      Trigger::Install => "install",
      Trigger::Startup => "startup",
      Trigger::CollectionCreated => "collection-created",
      Trigger::PinChanged => "pin-changed",
      Trigger::ItemCreated => "item-created",
      Trigger::Manual => "manual",
    }
  }
}

impl fmt::Display for Trigger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Action that failed while applying a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum FailedAction {
  List,
  Create { key: String, target: String },
  Update { instance: InstanceId, target: String },
  Remove { instances: Vec<InstanceId> },
}

impl fmt::Display for FailedAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FailedAction::List => write!(f, "list items"),
      FailedAction::Create { key, target } => write!(f, "create {target} for {key}"),
      FailedAction::Update { instance, target } => write!(f, "retarget {instance} to {target}"),
      FailedAction::Remove { instances } => {
        let ids: Vec<String> = instances.iter().map(|id| id.to_string()).collect();
        write!(f, "remove [{}]", ids.join(", "))
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
  pub collection: CollectionId,
  #[serde(flatten)]
  pub action: FailedAction,
  pub error: String,
}

/// What one pass did to one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionOutcome {
  pub collection: CollectionId,
  pub created: usize,
  pub updated: usize,
  pub removed: usize,
  pub failures: Vec<ActionFailure>,
}

impl CollectionOutcome {
  pub fn new(collection: CollectionId) -> Self {
    Self {
      collection,
      created: 0,
      updated: 0,
      removed: 0,
      failures: Vec::new(),
    }
  }

  pub fn changed(&self) -> bool {
    self.created + self.updated + self.removed > 0
  }
}

/// Summary of a completed reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
  pub collections: Vec<CollectionOutcome>,
  /// True if the canonical mapping was seeded during this pass.
  pub seeded: bool,
}

impl PassReport {
  /// True if every action of the pass succeeded.
  pub fn is_success(&self) -> bool {
    self.collections.iter().all(|c| c.failures.is_empty())
  }

  pub fn failures(&self) -> impl Iterator<Item = &ActionFailure> {
    self.collections.iter().flat_map(|c| c.failures.iter())
  }

  pub fn created(&self) -> usize {
    self.collections.iter().map(|c| c.created).sum()
  }

  pub fn updated(&self) -> usize {
    self.collections.iter().map(|c| c.updated).sum()
  }

  pub fn removed(&self) -> usize {
    self.collections.iter().map(|c| c.removed).sum()
  }
}

/// Errors from reconciliation passes and the engine.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("failed to enumerate collections: {0}")]
  Enumerate(#[source] HostError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("reconciliation pass aborted: {0}")]
  Aborted(String),

  /// A pass failure shared by every caller waiting on that pass.
  #[error("reconciliation pass failed: {0}")]
  Failed(#[source] Arc<SyncError>),

  #[error("sync engine is not running")]
  EngineStopped,
}
