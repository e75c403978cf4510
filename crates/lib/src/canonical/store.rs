//! Canonical store: load, save, seed, and pin/unpin transitions.

use serde_json::Value;
use tracing::{debug, info};

use super::kv::KvStore;
use super::types::{CanonicalMap, PinPolicy, StoreError};
use crate::host::ItemDescriptor;
use crate::identity::Identity;

/// Key the canonical mapping is stored under.
pub const STORAGE_KEY: &str = "canonical_pins";

/// Key used by older releases. Copied forward once while [`STORAGE_KEY`] has never been written.
pub const LEGACY_STORAGE_KEY: &str = "pinned_tabs";

/// Result of [`CanonicalStore::seed_if_empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMapping {
  pub mapping: CanonicalMap,
  /// True if the mapping was empty and has just been seeded.
  pub seeded: bool,
}

/// Persisted canonical mapping on top of a [`KvStore`].
///
/// Every transition is a read-modify-write against storage with no
/// transactional primitive. Two handlers racing on the same store can lose
/// an update; the convergence loop only mitigates this through debouncing.
#[derive(Debug)]
pub struct CanonicalStore<K> {
  kv: K,
}

impl<K: KvStore> CanonicalStore<K> {
  pub fn new(kv: K) -> Self {
    Self { kv }
  }

  pub fn kv(&self) -> &K {
    &self.kv
  }

  /// Loads the mapping. A store that has never been written loads empty.
  pub fn load(&mut self) -> Result<CanonicalMap, StoreError> {
    Ok(self.load_written()?.unwrap_or_default())
  }

  /// Reads the mapping without migrating or seeding. `None` if it has never
  /// been written and there is nothing to migrate.
  pub fn peek(&self) -> Result<Option<CanonicalMap>, StoreError> {
    match self.read_key(STORAGE_KEY)? {
      Some(current) => Ok(Some(current)),
      None => Ok(self.read_key(LEGACY_STORAGE_KEY)?.filter(|m| !m.is_empty())),
    }
  }

  /// Loads the mapping, or `None` if it has never been written.
  ///
  /// When [`STORAGE_KEY`] is absent and the legacy key holds a non-empty
  /// mapping, the legacy value is copied forward first. A mapping emptied by
  /// unpins is still written, so neither migration nor seeding runs again.
  fn load_written(&mut self) -> Result<Option<CanonicalMap>, StoreError> {
    if let Some(current) = self.read_key(STORAGE_KEY)? {
      return Ok(Some(current));
    }

    let Some(legacy) = self.read_key(LEGACY_STORAGE_KEY)?.filter(|m| !m.is_empty()) else {
      return Ok(None);
    };

    info!(entries = legacy.len(), "migrating canonical mapping from legacy storage key");
    self.save(&legacy)?;
    Ok(Some(legacy))
  }

  pub fn save(&mut self, mapping: &CanonicalMap) -> Result<(), StoreError> {
    let value = serde_json::to_value(mapping).map_err(StoreError::Serialize)?;
    self.kv.set(STORAGE_KEY, value)?;
    debug!(entries = mapping.len(), "canonical mapping saved");
    Ok(())
  }

  /// Loads the mapping, seeding it from `observe` if it has never been written.
  ///
  /// `observe` is only called for an unwritten store, and an empty
  /// observation leaves the store untouched, so seeding happens at most once.
  pub fn seed_if_empty(&mut self, observe: impl FnOnce() -> CanonicalMap) -> Result<LoadedMapping, StoreError> {
    if let Some(mapping) = self.load_written()? {
      return Ok(LoadedMapping { mapping, seeded: false });
    }

    let observed = observe();
    if observed.is_empty() {
      return Ok(LoadedMapping {
        mapping: observed,
        seeded: false,
      });
    }

    info!(entries = observed.len(), "seeding canonical mapping from pinned items");
    self.save(&observed)?;
    Ok(LoadedMapping {
      mapping: observed,
      seeded: true,
    })
  }

  /// Records a pin. Returns whether the mapping changed.
  pub fn pin(&mut self, key: &str, target: &str, policy: PinPolicy) -> Result<bool, StoreError> {
    let mut mapping = self.load()?;
    if !mapping.apply_pin(key, target, policy) {
      return Ok(false);
    }
    self.save(&mapping)?;
    info!(key, target, %policy, "canonical pin recorded");
    Ok(true)
  }

  /// Removes a key. Returns whether it was present.
  pub fn unpin(&mut self, key: &str) -> Result<bool, StoreError> {
    let mut mapping = self.load()?;
    if mapping.remove(key).is_none() {
      return Ok(false);
    }
    self.save(&mapping)?;
    info!(key, "canonical pin removed");
    Ok(true)
  }

  fn read_key(&self, key: &str) -> Result<Option<CanonicalMap>, StoreError> {
    match self.kv.get(key)? {
      None | Some(Value::Null) => Ok(None),
      Some(value) => serde_json::from_value(value)
        .map(Some)
        .map_err(|source| StoreError::Malformed {
          key: key.to_string(),
          source,
        }),
    }
  }
}

/// Mapping of every pinned, syncable item, first-seen target per key.
///
/// This is the seed for an empty store and, under the union policy, the
/// canonical mapping itself.
pub fn derive_union<'a>(items: impl IntoIterator<Item = &'a ItemDescriptor>, identity: &Identity) -> CanonicalMap {
  let mut mapping = CanonicalMap::new();
  for item in items.into_iter().filter(|item| item.pinned) {
    if let Some(classified) = identity.classify(item) {
      mapping.insert_if_absent(&classified.key, &classified.representation);
    }
  }
  mapping
}
