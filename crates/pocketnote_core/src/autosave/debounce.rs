//! Poll-driven debouncer.
//!
//! # Responsibility
//! - Coalesce rapid notifications into one payload, released only after a
//!   quiet window with no further notifications.
//!
//! # Invariants
//! - At most one payload is pending; each `notify` replaces it and pushes
//!   the deadline to `now + window`.
//! - `flush_pending` releases the payload regardless of the deadline.

use crate::clock::Clock;
use std::time::Duration;

/// Reference quiet window for note autosave.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);

#[derive(Debug)]
struct Pending<T> {
    payload: T,
    due_at_ms: i64,
}

/// Delay-and-coalesce scheduler driven by the caller's loop.
#[derive(Debug)]
pub struct Debouncer<T, C: Clock> {
    quiet_ms: i64,
    clock: C,
    pending: Option<Pending<T>>,
}

impl<T, C: Clock> Debouncer<T, C> {
    pub fn new(quiet_period: Duration, clock: C) -> Self {
        Self {
            quiet_ms: i64::try_from(quiet_period.as_millis()).unwrap_or(i64::MAX),
            clock,
            pending: None,
        }
    }

    /// Replaces the pending payload and restarts the quiet window.
    pub fn notify(&mut self, payload: T) {
        let due_at_ms = self.clock.now_ms().saturating_add(self.quiet_ms);
        self.pending = Some(Pending { payload, due_at_ms });
    }

    /// Releases the pending payload once its quiet window has elapsed.
    pub fn poll(&mut self) -> Option<T> {
        let now_ms = self.clock.now_ms();
        match &self.pending {
            Some(pending) if now_ms >= pending.due_at_ms => self.take(),
            _ => None,
        }
    }

    /// Releases the pending payload immediately.
    pub fn flush_pending(&mut self) -> Option<T> {
        self.take()
    }

    /// Drops the pending payload without releasing it to the action.
    pub fn cancel(&mut self) -> Option<T> {
        self.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Deadline of the pending payload in epoch milliseconds.
    pub fn due_at(&self) -> Option<i64> {
        self.pending.as_ref().map(|pending| pending.due_at_ms)
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.payload)
    }

    fn take(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.payload)
    }
}
