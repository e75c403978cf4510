//! Host backed by a JSON world file.
//!
//! The file is re-read on every call so that edits made by other processes
//! between calls are observed, and written atomically after every mutation.
//! File I/O runs on tokio's blocking pool so the engine keeps receiving
//! events while a pass reads and writes the world.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::Host;
use super::types::{CollectionId, HostError, InstanceId, ItemDescriptor};
use super::world::World;

#[derive(Debug, Clone)]
pub struct FileHost {
  path: PathBuf,
}

impl FileHost {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn read<T: Send + 'static>(
    &self,
    f: impl FnOnce(World) -> Result<T, HostError> + Send + 'static,
  ) -> Result<T, HostError> {
    let path = self.path.clone();
    tokio::task::spawn_blocking(move || f(World::load(&path)?))
      .await
      .map_err(|e| HostError::Task(e.to_string()))?
  }

  async fn mutate<T: Send + 'static>(
    &self,
    f: impl FnOnce(&mut World) -> Result<T, HostError> + Send + 'static,
  ) -> Result<T, HostError> {
    let path = self.path.clone();
    tokio::task::spawn_blocking(move || {
      let mut world = World::load(&path)?;
      let value = f(&mut world)?;
      world.save(&path)?;
      debug!(path = %path.display(), "world file updated");
      Ok(value)
    })
    .await
    .map_err(|e| HostError::Task(e.to_string()))?
  }
}

#[async_trait]
impl Host for FileHost {
  async fn list_collections(&self) -> Result<Vec<CollectionId>, HostError> {
    self.read(|world| Ok(world.collection_ids())).await
  }

  async fn list_items(&self, collection: CollectionId) -> Result<Vec<ItemDescriptor>, HostError> {
    self.read(move |world| world.items(collection)).await
  }

  async fn get_item(&self, instance: InstanceId) -> Result<Option<(CollectionId, ItemDescriptor)>, HostError> {
    self
      .read(move |world| Ok(world.find(instance).map(|(collection, item)| (collection, item.clone()))))
      .await
  }

  async fn create_pinned_item(&self, collection: CollectionId, representation: &str) -> Result<InstanceId, HostError> {
    let representation = representation.to_string();
    self
      .mutate(move |world| world.create_pinned(collection, &representation))
      .await
  }

  async fn retarget(&self, instance: InstanceId, representation: &str) -> Result<(), HostError> {
    let representation = representation.to_string();
    self.mutate(move |world| world.retarget(instance, &representation)).await
  }

  async fn remove(&self, instances: &[InstanceId]) -> Result<(), HostError> {
    let instances = instances.to_vec();
    self.mutate(move |world| world.remove(&instances)).await
  }
}
