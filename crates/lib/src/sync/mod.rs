//! Convergence loop: debounced, single-flight reconciliation passes.
//!
//! # Flow
//!
//! 1. A host event arrives through a [`SyncHandle`]
//! 2. Pin and unpin events update the canonical store (unpins only after a
//!    confirmation delay)
//! 3. The event's [`Trigger`] schedules a debounced pass; a newer trigger
//!    replaces the pending one
//! 4. The pass ([`run_pass`]) computes and applies a plan per collection,
//!    marking the suppression window before each mutation
//! 5. Events caused by those mutations fall inside the window and are ignored
//!
//! Only one pass runs at a time. Requests arriving mid-pass collapse into a
//! single follow-up pass ([`LoopState::ReconcilingWithPending`]).

mod engine;
mod pass;
mod scheduler;
mod suppress;
mod types;

pub use engine::{SyncEngine, SyncHandle};
pub use pass::{CollectionPlan, PassContext, preview_pass, run_pass};
pub use scheduler::{Debouncer, LoopState, Scheduler};
pub use suppress::Suppressor;
pub use types::{ActionFailure, CollectionOutcome, FailedAction, HostEvent, PassReport, SyncError, Trigger};
