//! Debounce and in-flight bookkeeping of the convergence loop.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Reconciliation state of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopState {
  #[default]
  Idle,
  Reconciling,
  /// A pass is in flight and another one was requested since it started.
  ReconcilingWithPending,
}

impl fmt::Display for LoopState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      LoopState::Idle => "idle",
      LoopState::Reconciling => "reconciling",
      LoopState::ReconcilingWithPending => "reconciling-with-pending",
    };
    f.write_str(s)
  }
}

/// In-flight guard: at most one pass at a time, at most one follow-up.
#[derive(Debug, Default)]
pub struct Scheduler {
  state: LoopState,
}

impl Scheduler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> LoopState {
    self.state
  }

  /// Records a reconcile request. Returns true if a pass should start now.
  pub fn request(&mut self) -> bool {
    match self.state {
      LoopState::Idle => {
        self.state = LoopState::Reconciling;
        true
      }
      LoopState::Reconciling | LoopState::ReconcilingWithPending => {
        self.state = LoopState::ReconcilingWithPending;
        false
      }
    }
  }

  /// Records the end of a pass. Returns true if a follow-up pass should start now.
  pub fn complete(&mut self) -> bool {
    match self.state {
      LoopState::ReconcilingWithPending => {
        self.state = LoopState::Reconciling;
        true
      }
      LoopState::Reconciling | LoopState::Idle => {
        self.state = LoopState::Idle;
        false
      }
    }
  }
}

/// Single pending deadline. Scheduling replaces whatever was pending.
#[derive(Debug, Default)]
pub struct Debouncer {
  deadline: Option<Instant>,
}

impl Debouncer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn schedule(&mut self, now: Instant, delay: Duration) {
    self.deadline = Some(now + delay);
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  pub fn cancel(&mut self) {
    self.deadline = None;
  }

  /// Clears and reports the deadline if it has passed.
  pub fn fire(&mut self, now: Instant) -> bool {
    match self.deadline {
      Some(deadline) if deadline <= now => {
        self.deadline = None;
        true
      }
      _ => false,
    }
  }
}
