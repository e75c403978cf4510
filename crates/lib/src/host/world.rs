//! Serializable snapshot of collections and their items.
//!
//! # Example World File
//!
//! ```json
//! {
//!   "collections": [
//!     {
//!       "id": 1,
//!       "items": [
//!         { "id": 10, "committed": "https://mail.example.com/", "pinned": true },
//!         { "id": 11, "committed": "https://news.example.com/" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{CollectionId, HostError, InstanceId, ItemDescriptor};

/// One collection and its items in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldCollection {
  pub id: CollectionId,

  #[serde(default)]
  pub items: Vec<ItemDescriptor>,
}

/// Every collection known to a host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
  #[serde(default)]
  pub collections: Vec<WorldCollection>,
}

impl World {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a collection with the given items. Builder-style, for fixtures.
  pub fn with_collection(mut self, id: u64, items: Vec<ItemDescriptor>) -> Self {
    self.collections.push(WorldCollection {
      id: CollectionId(id),
      items,
    });
    self
  }

  /// Load a world from a JSON file.
  ///
  /// Returns an empty world if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Self, HostError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
      Err(e) => return Err(HostError::Read(e)),
    };

    serde_json::from_str(&content).map_err(HostError::Parse)
  }

  /// Save the world to a JSON file.
  ///
  /// Uses atomic write (write to temp, then rename) to prevent corruption.
  pub fn save(&self, path: &Path) -> Result<(), HostError> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(HostError::Write)?;
    }

    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(self).map_err(HostError::Serialize)?;
    fs::write(&temp_path, &content).map_err(HostError::Write)?;
    fs::rename(&temp_path, path).map_err(HostError::Write)?;

    Ok(())
  }

  pub fn collection_ids(&self) -> Vec<CollectionId> {
    self.collections.iter().map(|c| c.id).collect()
  }

  pub fn collection(&self, id: CollectionId) -> Option<&WorldCollection> {
    self.collections.iter().find(|c| c.id == id)
  }

  fn collection_mut(&mut self, id: CollectionId) -> Result<&mut WorldCollection, HostError> {
    self
      .collections
      .iter_mut()
      .find(|c| c.id == id)
      .ok_or(HostError::CollectionNotFound(id))
  }

  pub fn items(&self, id: CollectionId) -> Result<Vec<ItemDescriptor>, HostError> {
    self
      .collection(id)
      .map(|c| c.items.clone())
      .ok_or(HostError::CollectionNotFound(id))
  }

  /// Finds an instance and the collection holding it.
  pub fn find(&self, instance: InstanceId) -> Option<(CollectionId, &ItemDescriptor)> {
    self
      .collections
      .iter()
      .find_map(|c| c.items.iter().find(|i| i.id == instance).map(|i| (c.id, i)))
  }

  fn find_mut(&mut self, instance: InstanceId) -> Option<&mut ItemDescriptor> {
    self
      .collections
      .iter_mut()
      .flat_map(|c| c.items.iter_mut())
      .find(|i| i.id == instance)
  }

  /// Instance ids are unique across the whole world.
  fn next_instance_id(&self) -> Result<InstanceId, HostError> {
    let max = self
      .collections
      .iter()
      .flat_map(|c| c.items.iter())
      .map(|i| i.id.0)
      .max()
      .unwrap_or(0);
    max.checked_add(1).map(InstanceId).ok_or(HostError::IdsExhausted)
  }

  /// Appends a pinned instance committed to `representation`.
  pub fn create_pinned(&mut self, collection: CollectionId, representation: &str) -> Result<InstanceId, HostError> {
    let id = self.next_instance_id()?;
    let target = self.collection_mut(collection)?;
    target.items.push(ItemDescriptor::pinned_at(id.0, representation));
    Ok(id)
  }

  pub fn retarget(&mut self, instance: InstanceId, representation: &str) -> Result<(), HostError> {
    let item = self.find_mut(instance).ok_or(HostError::InstanceNotFound(instance))?;
    item.committed = Some(representation.to_string());
    item.pending = None;
    Ok(())
  }

  /// Removes every listed instance.
  ///
  /// Fails without removing anything if one of them does not exist.
  pub fn remove(&mut self, instances: &[InstanceId]) -> Result<(), HostError> {
    if let Some(missing) = instances.iter().find(|id| self.find(**id).is_none()) {
      return Err(HostError::InstanceNotFound(*missing));
    }

    for collection in &mut self.collections {
      collection.items.retain(|item| !instances.contains(&item.id));
    }
    Ok(())
  }

  /// Targets of the pinned instances of a collection, in order.
  pub fn pinned_targets(&self, id: CollectionId) -> Vec<String> {
    self
      .collection(id)
      .map(|c| {
        c.items
          .iter()
          .filter(|i| i.pinned)
          .filter_map(|i| i.committed.clone().or_else(|| i.pending.clone()))
          .collect()
      })
      .unwrap_or_default()
  }
}
