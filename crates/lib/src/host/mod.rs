//! Host abstraction over collections of pinned items.
//!
//! The reconciliation core never talks to a browser directly. Everything it
//! needs from the outside world goes through the [`Host`] trait: enumerating
//! collections and their items, and the three mutation primitives used to
//! apply a plan.
//!
//! Two hosts ship with the crate:
//! - [`MemoryHost`]: an in-process [`World`], used by tests and simulations
//! - [`FileHost`]: a [`World`] persisted as JSON, driven by the CLI

mod file;
mod memory;
mod types;
mod world;

use async_trait::async_trait;

pub use file::FileHost;
pub use memory::MemoryHost;
pub use types::{CollectionId, HostError, InstanceId, ItemDescriptor};
pub use world::{World, WorldCollection};

/// Enumeration and mutation primitives the convergence loop consumes.
///
/// Every call may fail independently. Failures are logged by the caller and
/// never abort reconciliation of other collections.
#[async_trait]
pub trait Host: Send + Sync {
  /// Lists every collection currently open.
  async fn list_collections(&self) -> Result<Vec<CollectionId>, HostError>;

  /// Lists the items of one collection, in host enumeration order.
  async fn list_items(&self, collection: CollectionId) -> Result<Vec<ItemDescriptor>, HostError>;

  /// Re-queries a single instance. Returns `None` if it no longer exists.
  async fn get_item(&self, instance: InstanceId) -> Result<Option<(CollectionId, ItemDescriptor)>, HostError>;

  /// Creates a pinned instance navigating to `representation`.
  async fn create_pinned_item(&self, collection: CollectionId, representation: &str) -> Result<InstanceId, HostError>;

  /// Points an existing instance at `representation`.
  async fn retarget(&self, instance: InstanceId, representation: &str) -> Result<(), HostError>;

  /// Destroys the given instances.
  async fn remove(&self, instances: &[InstanceId]) -> Result<(), HostError>;

  /// Whether [`Host::retarget`] is available. Updates are skipped otherwise.
  fn supports_retarget(&self) -> bool {
    true
  }
}
