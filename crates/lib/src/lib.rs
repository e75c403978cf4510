//! pinsync-lib: Core types and logic for pinsync
//!
//! pinsync keeps the pinned items of every collection (pinned tabs of every
//! browser window) converged on one canonical set:
//! - `identity`: syncability, normalization and identity keys
//! - `plan`: pure create/update/remove plans for one collection
//! - `canonical`: the persisted canonical mapping and its pin/unpin transitions
//! - `host`: the enumeration and mutation primitives of the outside world
//! - `sync`: the debounced, single-flight convergence loop

pub mod canonical;
pub mod config;
pub mod consts;
pub mod host;
pub mod identity;
pub mod plan;
pub mod platform;
pub mod sync;
