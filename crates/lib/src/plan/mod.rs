//! Reconciliation plans.
//!
//! A [`Plan`] describes what needs to happen to one collection so that its
//! pinned items match the canonical mapping. It is computed by the pure
//! function [`compute_plan`] and applied by the convergence loop.

mod compute;
mod types;

pub use compute::compute_plan;
pub use types::{Plan, PlanCreate, PlanUpdate};
