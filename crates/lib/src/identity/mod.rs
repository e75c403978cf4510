//! Identity and normalization of pinned targets.
//!
//! Decides when two differently-specified targets refer to the same thing:
//! - [`normalize`] canonicalizes a raw target string
//! - [`resolve_raw_target`] picks the committed or pending target of an item
//! - [`Identity`] applies the scheme allow-list and the identity policy

mod normalize;
mod policy;

pub use normalize::{normalize, resolve_raw_target};
pub use policy::{Classified, DEFAULT_SCHEMES, HostPattern, Identity, IdentityPolicy};
