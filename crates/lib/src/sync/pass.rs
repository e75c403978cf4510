//! A single reconciliation pass across every collection.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::suppress::Suppressor;
use super::types::{ActionFailure, CollectionOutcome, FailedAction, PassReport, SyncError};
use crate::canonical::{CanonicalStore, KvStore, LoadedMapping, PinPolicy, derive_union};
use crate::config::SyncConfig;
use crate::host::{CollectionId, Host, HostError, ItemDescriptor};
use crate::identity::Identity;
use crate::plan::{Plan, compute_plan};

/// Everything a pass needs besides the host and the store.
#[derive(Debug, Clone)]
pub struct PassContext {
  pub identity: Identity,
  pub policy: PinPolicy,
  pub suppressor: Suppressor,
  pub suppression_window: Duration,
}

impl PassContext {
  pub fn from_config(config: &SyncConfig) -> Self {
    Self {
      identity: config.identity(),
      policy: config.policy,
      suppressor: Suppressor::new(),
      suppression_window: config.timing.suppression_window,
    }
  }
}

/// The plan computed for one collection, without applying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionPlan {
  pub collection: CollectionId,
  pub plan: Plan,
}

/// Pinned items of every collection that could be listed.
struct Observation {
  collections: Vec<(CollectionId, Vec<ItemDescriptor>)>,
  unlisted: Vec<(CollectionId, HostError)>,
}

impl Observation {
  fn pinned_items(&self) -> impl Iterator<Item = &ItemDescriptor> {
    self.collections.iter().flat_map(|(_, items)| items.iter())
  }
}

async fn observe<H: Host + ?Sized>(host: &H) -> Result<Observation, SyncError> {
  let ids = host.list_collections().await.map_err(SyncError::Enumerate)?;

  let mut observation = Observation {
    collections: Vec::with_capacity(ids.len()),
    unlisted: Vec::new(),
  };
  for id in ids {
    match host.list_items(id).await {
      Ok(items) => {
        let pinned = items.into_iter().filter(|item| item.pinned).collect();
        observation.collections.push((id, pinned));
      }
      Err(e) => {
        warn!(collection = %id, error = %e, "failed to list items, skipping collection");
        observation.unlisted.push((id, e));
      }
    }
  }
  Ok(observation)
}

/// Resolves the canonical mapping for this pass, seeding an empty store.
async fn resolve_canonical<K: KvStore>(
  store: &Mutex<CanonicalStore<K>>,
  observation: &Observation,
  ctx: &PassContext,
) -> Result<LoadedMapping, SyncError> {
  let union = || derive_union(observation.pinned_items(), &ctx.identity);
  if ctx.policy.is_derived() {
    return Ok(LoadedMapping {
      mapping: union(),
      seeded: false,
    });
  }
  Ok(store.lock().await.seed_if_empty(union)?)
}

/// Computes the plan of every collection without mutating anything.
///
/// An unwritten store is neither migrated nor seeded; the plans are computed
/// against the mapping seeding would produce.
pub async fn preview_pass<H: Host + ?Sized, K: KvStore>(
  host: &H,
  store: &Mutex<CanonicalStore<K>>,
  ctx: &PassContext,
) -> Result<Vec<CollectionPlan>, SyncError> {
  let observation = observe(host).await?;
  let written = if ctx.policy.is_derived() {
    None
  } else {
    store.lock().await.peek()?
  };
  let canonical = written.unwrap_or_else(|| derive_union(observation.pinned_items(), &ctx.identity));

  Ok(
    observation
      .collections
      .iter()
      .map(|(collection, items)| CollectionPlan {
        collection: *collection,
        plan: compute_plan(items, &canonical, &ctx.identity, ctx.policy),
      })
      .collect(),
  )
}

/// Runs one full reconciliation pass.
///
/// Loads (or seeds, or derives) the canonical mapping, then computes and
/// applies the plan of every collection. Failures of individual actions are
/// logged and recorded in the report; they never stop the remaining work.
/// Only enumeration and store failures fail the pass.
pub async fn run_pass<H: Host + ?Sized, K: KvStore>(
  host: &H,
  store: &Mutex<CanonicalStore<K>>,
  ctx: &PassContext,
) -> Result<PassReport, SyncError> {
  info!(policy = %ctx.policy, "reconciliation pass started");

  let observation = observe(host).await?;
  let LoadedMapping { mapping, seeded } = resolve_canonical(store, &observation, ctx).await?;

  let mut report = PassReport {
    collections: Vec::with_capacity(observation.collections.len() + observation.unlisted.len()),
    seeded,
  };

  for (collection, items) in &observation.collections {
    let plan = compute_plan(items, &mapping, &ctx.identity, ctx.policy);
    let mut outcome = CollectionOutcome::new(*collection);
    if !plan.is_empty() {
      debug!(
        collection = %collection,
        create = plan.to_create.len(),
        update = plan.to_update.len(),
        remove = plan.to_remove.len(),
        "applying plan"
      );
      apply_plan(host, *collection, plan, ctx, &mut outcome).await;
    }
    report.collections.push(outcome);
  }

  for (collection, e) in observation.unlisted {
    let mut outcome = CollectionOutcome::new(collection);
    outcome.failures.push(ActionFailure {
      collection,
      action: FailedAction::List,
      error: e.to_string(),
    });
    report.collections.push(outcome);
  }

  info!(
    collections = report.collections.len(),
    created = report.created(),
    updated = report.updated(),
    removed = report.removed(),
    failures = report.failures().count(),
    seeded,
    "reconciliation pass finished"
  );
  Ok(report)
}

/// Applies creates, then updates, then removes. Each mutation is preceded by
/// extending the suppression window.
async fn apply_plan<H: Host + ?Sized>(
  host: &H,
  collection: CollectionId,
  plan: Plan,
  ctx: &PassContext,
  outcome: &mut CollectionOutcome,
) {
  for create in plan.to_create {
    ctx.suppressor.mark(ctx.suppression_window);
    match host.create_pinned_item(collection, &create.target).await {
      Ok(instance) => {
        debug!(collection = %collection, key = %create.key, target = %create.target, %instance, "created pinned item");
        outcome.created += 1;
      }
      Err(e) => {
        error!(collection = %collection, key = %create.key, target = %create.target, error = %e, "failed to create pinned item");
        outcome.failures.push(ActionFailure {
          collection,
          action: FailedAction::Create {
            key: create.key,
            target: create.target,
          },
          error: e.to_string(),
        });
      }
    }
  }

  if !plan.to_update.is_empty() && !host.supports_retarget() {
    debug!(collection = %collection, count = plan.to_update.len(), "host cannot retarget, skipping updates");
  } else {
    for update in plan.to_update {
      ctx.suppressor.mark(ctx.suppression_window);
      match host.retarget(update.instance, &update.target).await {
        Ok(()) => {
          debug!(collection = %collection, instance = %update.instance, target = %update.target, "retargeted item");
          outcome.updated += 1;
        }
        Err(e) => {
          error!(collection = %collection, instance = %update.instance, target = %update.target, error = %e, "failed to retarget item");
          outcome.failures.push(ActionFailure {
            collection,
            action: FailedAction::Update {
              instance: update.instance,
              target: update.target,
            },
            error: e.to_string(),
          });
        }
      }
    }
  }

  if !plan.to_remove.is_empty() {
    ctx.suppressor.mark(ctx.suppression_window);
    match host.remove(&plan.to_remove).await {
      Ok(()) => {
        debug!(collection = %collection, count = plan.to_remove.len(), "removed items");
        outcome.removed += plan.to_remove.len();
      }
      Err(e) => {
        error!(collection = %collection, instances = ?plan.to_remove, error = %e, "failed to remove items");
        outcome.failures.push(ActionFailure {
          collection,
          action: FailedAction::Remove {
            instances: plan.to_remove,
          },
          error: e.to_string(),
        });
      }
    }
  }
}
