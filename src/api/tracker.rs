//! Latest-request-wins guard.
//!
//! Each view that can be refetched while a previous fetch is in flight takes
//! a ticket before sending. Only the holder of the newest ticket may install
//! its response; older responses are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
  latest: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

impl RequestTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start a request, superseding all earlier tickets
  pub fn begin(&self) -> RequestTicket {
    RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
  }

  pub fn is_current(&self, ticket: RequestTicket) -> bool {
    self.latest.load(Ordering::SeqCst) == ticket.0
  }

  /// Keep `value` only if no newer request has started
  pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
    if self.is_current(ticket) {
      Some(value)
    } else {
      tracing::debug!("Discarding stale response for request #{}", ticket.0);
      None
    }
  }
}
