//! Plan computation between the canonical mapping and one collection.

use std::collections::BTreeMap;

use super::types::{Plan, PlanCreate, PlanUpdate};
use crate::canonical::{CanonicalMap, PinPolicy};
use crate::host::{InstanceId, ItemDescriptor};
use crate::identity::Identity;

/// A syncable instance with its normalized target.
struct Present {
  id: InstanceId,
  representation: String,
}

/// Compute the plan that converges one collection toward `canonical`.
///
/// # Arguments
///
/// * `items` - Pinned items of the collection, in host enumeration order
/// * `canonical` - The desired mapping from identity key to target
/// * `identity` - Syncability rules and identity policy
/// * `policy` - Pin policy; only `ReplaceWithNewest` produces updates
///
/// # Plan Logic
///
/// Items whose resolved target is not syncable are invisible: they are never
/// created, updated or removed. The rest are grouped by identity key,
/// preserving input order within each key.
///
/// For every canonical key, in sorted key order:
/// - No instance under the key → `to_create`
/// - Otherwise the first instance is kept and every later one → `to_remove`
/// - Under `ReplaceWithNewest`, a kept instance whose target differs → `to_update`
///
/// Then, for every key absent from `canonical` (sorted), all of its
/// instances → `to_remove`.
///
/// The function is total and deterministic: identical inputs always produce
/// identical lists in identical order.
pub fn compute_plan(items: &[ItemDescriptor], canonical: &CanonicalMap, identity: &Identity, policy: PinPolicy) -> Plan {
  let groups = group_by_key(items, identity);
  let mut plan = Plan::default();

  for (key, target) in canonical.iter() {
    let Some((kept, duplicates)) = groups.get(key).and_then(|present| present.split_first()) else {
      plan.to_create.push(PlanCreate {
        key: key.to_string(),
        target: target.to_string(),
      });
      continue;
    };

    if policy.updates_content() && kept.representation != target {
      plan.to_update.push(PlanUpdate {
        instance: kept.id,
        target: target.to_string(),
      });
    }

    plan.to_remove.extend(duplicates.iter().map(|present| present.id));
  }

  for (key, present) in &groups {
    if !canonical.contains_key(key) {
      plan.to_remove.extend(present.iter().map(|present| present.id));
    }
  }

  plan
}

/// Group syncable items by identity key, keeping input order per key.
fn group_by_key(items: &[ItemDescriptor], identity: &Identity) -> BTreeMap<String, Vec<Present>> {
  let mut groups: BTreeMap<String, Vec<Present>> = BTreeMap::new();
  for item in items {
    if let Some(classified) = identity.classify(item) {
      groups.entry(classified.key).or_default().push(Present {
        id: item.id,
        representation: classified.representation,
      });
    }
  }
  groups
}
