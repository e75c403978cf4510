//! Self-feedback suppression window.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Shared deadline before which pin, unpin and creation events are treated
/// as echoes of the loop's own mutations.
///
/// This is a wall-clock heuristic. A mutation batch that runs longer than the
/// window, or a genuine user action landing inside it, is not told apart.
#[derive(Debug, Clone, Default)]
pub struct Suppressor {
  until: Arc<Mutex<Option<Instant>>>,
}

impl Suppressor {
  pub fn new() -> Self {
    Self::default()
  }

  /// Extends the window to at least `window` from now.
  pub fn mark(&self, window: Duration) {
    let deadline = Instant::now() + window;
    let mut until = self.until.lock().unwrap_or_else(PoisonError::into_inner);
    if until.is_none_or(|current| current < deadline) {
      *until = Some(deadline);
    }
  }

  pub fn is_suppressed(&self) -> bool {
    let until = self.until.lock().unwrap_or_else(PoisonError::into_inner);
    until.is_some_and(|deadline| Instant::now() < deadline)
  }
}
