//! Lifecycle states of a task cell.
//!
//! The state word is the only thing a readiness signal touches besides the
//! ready queue, which is what lets duplicate wake-ups collapse into a single
//! queue entry.

/// Task is parked: it returned `Poll::Pending` and is not in the ready queue.
///
/// A wake-up moves it to [`QUEUED`] and pushes it onto the queue.
pub(crate) const IDLE: usize = 0;

/// Task sits in the ready queue waiting for a progress attempt.
///
/// Further wake-ups are no-ops: the pending queue entry already covers them.
pub(crate) const QUEUED: usize = 1;

/// The scheduler is currently polling the task.
///
/// Only the executor thread ever observes a task in this state from the
/// inside, which is what makes the future slot effectively uncontended.
pub(crate) const RUNNING: usize = 2;

/// The task produced its output (or panicked) and will not be polled again.
///
/// Wake-ups are silently ignored.
pub(crate) const COMPLETED: usize = 3;

/// The task was woken while [`RUNNING`].
///
/// Once the current attempt returns `Poll::Pending` the task is re-queued
/// instead of parked.
pub(crate) const NOTIFIED: usize = 4;

/// Human readable name of a state word, for logs.
pub(crate) fn name(state: usize) -> &'static str {
    match state {
        IDLE => "idle",
        QUEUED => "queued",
        RUNNING => "running",
        COMPLETED => "completed",
        NOTIFIED => "notified",
        _ => "unknown",
    }
}
