use serde::{Deserialize, Serialize};

use crate::host::InstanceId;

/// An identity key with no instance in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCreate {
  pub key: String,
  pub target: String,
}

/// A kept instance whose content differs from its canonical target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanUpdate {
  pub instance: InstanceId,
  pub target: String,
}

/// Corrective actions for one collection.
///
/// An instance id appears in at most one of `to_update` and `to_remove`.
/// `to_create` carries keys, never instance ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
  pub to_create: Vec<PlanCreate>,
  pub to_update: Vec<PlanUpdate>,
  pub to_remove: Vec<InstanceId>,
}

impl Plan {
  /// Returns true if the collection already matches the canonical mapping.
  pub fn is_empty(&self) -> bool {
    self.to_create.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
  }

  /// Total number of actions in the plan.
  pub fn action_count(&self) -> usize {
    self.to_create.len() + self.to_update.len() + self.to_remove.len()
  }
}
