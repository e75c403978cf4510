//! Shared helpers for library integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pinsync_lib::canonical::{CanonicalMap, CanonicalStore, MemoryKv};
use pinsync_lib::config::{IdentityMode, SyncConfig};
use pinsync_lib::host::{CollectionId, Host, HostError, InstanceId, ItemDescriptor, MemoryHost, World};
use pinsync_lib::sync::{SyncEngine, SyncHandle};
use tokio::sync::Mutex;

/// A [`MemoryHost`] that counts passes and can be slowed down or broken.
pub struct CountingHost {
  pub inner: MemoryHost,
  passes: AtomicUsize,
  enumeration_delay: Duration,
  fail_enumeration: AtomicBool,
}

impl CountingHost {
  pub fn new(world: World) -> Self {
    Self {
      inner: MemoryHost::new(world),
      passes: AtomicUsize::new(0),
      enumeration_delay: Duration::ZERO,
      fail_enumeration: AtomicBool::new(false),
    }
  }

  /// Every pass spends `delay` enumerating collections.
  pub fn slow(mut self, delay: Duration) -> Self {
    self.enumeration_delay = delay;
    self
  }

  pub fn break_enumeration(&self) {
    self.fail_enumeration.store(true, Ordering::SeqCst);
  }

  /// Number of passes that have started.
  pub fn passes(&self) -> usize {
    self.passes.load(Ordering::SeqCst)
  }

  pub fn pinned_targets(&self, collection: u64) -> Vec<String> {
    self.inner.snapshot().pinned_targets(CollectionId(collection))
  }

  /// Simulates the user flipping the pin state of an instance.
  pub fn set_pinned(&self, instance: u64, pinned: bool) {
    self.inner.update(|world| {
      for collection in &mut world.collections {
        for item in &mut collection.items {
          if item.id == InstanceId(instance) {
            item.pinned = pinned;
          }
        }
      }
    });
  }

  /// Simulates the user adding a pinned item to a collection.
  pub fn add_item(&self, collection: u64, item: ItemDescriptor) {
    self.inner.update(|world| {
      if let Some(target) = world.collections.iter_mut().find(|c| c.id == CollectionId(collection)) {
        target.items.push(item);
      }
    });
  }

  /// Simulates a collection being closed.
  pub fn close_collection(&self, collection: u64) {
    self
      .inner
      .update(|world| world.collections.retain(|c| c.id != CollectionId(collection)));
  }
}

#[async_trait]
impl Host for CountingHost {
  async fn list_collections(&self) -> Result<Vec<CollectionId>, HostError> {
    self.passes.fetch_add(1, Ordering::SeqCst);
    if !self.enumeration_delay.is_zero() {
      tokio::time::sleep(self.enumeration_delay).await;
    }
    if self.fail_enumeration.load(Ordering::SeqCst) {
      return Err(HostError::Rejected {
        operation: "list",
        collection: CollectionId(0),
      });
    }
    self.inner.list_collections().await
  }

  async fn list_items(&self, collection: CollectionId) -> Result<Vec<ItemDescriptor>, HostError> {
    self.inner.list_items(collection).await
  }

  async fn get_item(&self, instance: InstanceId) -> Result<Option<(CollectionId, ItemDescriptor)>, HostError> {
    self.inner.get_item(instance).await
  }

  async fn create_pinned_item(&self, collection: CollectionId, representation: &str) -> Result<InstanceId, HostError> {
    self.inner.create_pinned_item(collection, representation).await
  }

  async fn retarget(&self, instance: InstanceId, representation: &str) -> Result<(), HostError> {
    self.inner.retarget(instance, representation).await
  }

  async fn remove(&self, instances: &[InstanceId]) -> Result<(), HostError> {
    self.inner.remove(instances).await
  }
}

pub type SharedStore = Arc<Mutex<CanonicalStore<MemoryKv>>>;

pub fn store_with(entries: &[(&str, &str)]) -> SharedStore {
  let mut store = CanonicalStore::new(MemoryKv::new());
  if !entries.is_empty() {
    store.save(&entries.iter().copied().collect()).unwrap();
  }
  Arc::new(Mutex::new(store))
}

pub async fn canonical(store: &SharedStore) -> CanonicalMap {
  store.lock().await.load().unwrap()
}

pub fn grouped_config() -> SyncConfig {
  let mut config = SyncConfig::default();
  config.identity.mode = IdentityMode::Grouped;
  config
}

pub fn start(host: &Arc<CountingHost>, store: &SharedStore, config: SyncConfig) -> SyncHandle {
  SyncEngine::spawn(Arc::clone(host), Arc::clone(store), config)
}

/// Two windows sharing the pinned items `a.test` and `b.test`.
pub fn two_synced_windows() -> World {
  World::new()
    .with_collection(
      1,
      vec![
        ItemDescriptor::pinned_at(1, "https://a.test/"),
        ItemDescriptor::pinned_at(2, "https://b.test/"),
      ],
    )
    .with_collection(
      2,
      vec![
        ItemDescriptor::pinned_at(3, "https://a.test/"),
        ItemDescriptor::pinned_at(4, "https://b.test/"),
      ],
    )
}

pub fn synced_store() -> SharedStore {
  store_with(&[
    ("https://a.test/", "https://a.test/"),
    ("https://b.test/", "https://b.test/"),
  ])
}
