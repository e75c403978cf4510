//! Canonical mapping: the desired pinned state every collection converges to.
//!
//! The mapping is persisted through a [`KvStore`] under a single key and is
//! only mutated by explicit pin/unpin transitions, a one-time seed from
//! observed reality, or (under the union policy) not persisted at all and
//! recomputed by [`derive_union`] on every pass.

mod kv;
mod store;
mod types;

pub use kv::{JsonFileKv, KvStore, MemoryKv};
pub use store::{CanonicalStore, LEGACY_STORAGE_KEY, LoadedMapping, STORAGE_KEY, derive_union};
pub use types::{CanonicalMap, PinPolicy, StoreError};
