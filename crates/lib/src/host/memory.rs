//! In-process host backed by a [`World`].

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::Host;
use super::types::{CollectionId, HostError, InstanceId, ItemDescriptor};
use super::world::World;

/// A host whose collections live in memory.
///
/// Mutations can be made to fail per collection with
/// [`MemoryHost::fail_mutations_in`], which is how partial-failure handling
/// of the convergence loop is exercised.
#[derive(Debug, Default)]
pub struct MemoryHost {
  world: Mutex<World>,
  failing: Mutex<BTreeSet<CollectionId>>,
  retarget_disabled: bool,
}

impl MemoryHost {
  pub fn new(world: World) -> Self {
    Self {
      world: Mutex::new(world),
      failing: Mutex::new(BTreeSet::new()),
      retarget_disabled: false,
    }
  }

  /// Reports [`Host::supports_retarget`] as false.
  pub fn without_retarget(mut self) -> Self {
    self.retarget_disabled = true;
    self
  }

  /// Returns a copy of the current world.
  pub fn snapshot(&self) -> World {
    self.world().clone()
  }

  /// Mutates the world directly, as a user would.
  pub fn update<T>(&self, f: impl FnOnce(&mut World) -> T) -> T {
    f(&mut self.world())
  }

  /// Makes every create, retarget and remove touching `collection` fail.
  pub fn fail_mutations_in(&self, collection: CollectionId) {
    self.failing.lock().unwrap_or_else(PoisonError::into_inner).insert(collection);
  }

  fn world(&self) -> MutexGuard<'_, World> {
    self.world.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn check(&self, operation: &'static str, collection: CollectionId) -> Result<(), HostError> {
    let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
    if failing.contains(&collection) {
      return Err(HostError::Rejected { operation, collection });
    }
    Ok(())
  }

  fn owner(&self, instance: InstanceId) -> Result<CollectionId, HostError> {
    self
      .world()
      .find(instance)
      .map(|(collection, _)| collection)
      .ok_or(HostError::InstanceNotFound(instance))
  }
}

#[async_trait]
impl Host for MemoryHost {
  async fn list_collections(&self) -> Result<Vec<CollectionId>, HostError> {
    Ok(self.world().collection_ids())
  }

  async fn list_items(&self, collection: CollectionId) -> Result<Vec<ItemDescriptor>, HostError> {
    self.world().items(collection)
  }

  async fn get_item(&self, instance: InstanceId) -> Result<Option<(CollectionId, ItemDescriptor)>, HostError> {
    Ok(
      self
        .world()
        .find(instance)
        .map(|(collection, item)| (collection, item.clone())),
    )
  }

  async fn create_pinned_item(&self, collection: CollectionId, representation: &str) -> Result<InstanceId, HostError> {
    self.check("create", collection)?;
    self.world().create_pinned(collection, representation)
  }

  async fn retarget(&self, instance: InstanceId, representation: &str) -> Result<(), HostError> {
    self.check("retarget", self.owner(instance)?)?;
    self.world().retarget(instance, representation)
  }

  async fn remove(&self, instances: &[InstanceId]) -> Result<(), HostError> {
    for instance in instances {
      self.check("remove", self.owner(*instance)?)?;
    }
    self.world().remove(instances)
  }

  fn supports_retarget(&self) -> bool {
    !self.retarget_disabled
  }
}
