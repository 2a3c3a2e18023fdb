use super::{Id, JoinError};

use parking_lot::Mutex;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// Completion slot shared between a task and its [`JoinHandle`].
///
/// Written once by the task (output, panic or cancellation) and read once by
/// the handle. Both sides may live on different threads.
pub(crate) struct Slot<T> {
    inner: Mutex<SlotInner<T>>,
}

struct SlotInner<T> {
    stage: Stage<T>,

    /// Waker of whoever is awaiting the join handle.
    waiter: Option<Waker>,
}

enum Stage<T> {
    Running,
    Finished(Result<T, JoinError>),
    Consumed,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                stage: Stage::Running,
                waiter: None,
            }),
        }
    }

    /// Publishes the task's result and wakes the registered waiter.
    ///
    /// Only the first call has an effect.
    pub(crate) fn complete(&self, result: Result<T, JoinError>) {
        let waiter = {
            let mut inner = self.inner.lock();

            if !matches!(inner.stage, Stage::Running) {
                return;
            }

            inner.stage = Stage::Finished(result);
            inner.waiter.take()
        };

        // Wake outside the lock: the waiter may be polled on another thread
        // right away.
        if let Some(waker) = waiter {
            waker.wake();
        }
    }
}

/// An owned permission to await the result of a spawned task.
///
/// A `JoinHandle` is returned by [`spawn`](crate::spawn),
/// [`Spawner::spawn`](crate::Spawner::spawn) and
/// [`Runtime::spawn`](crate::Runtime::spawn). It is itself a future that
/// resolves to `Ok(output)` once the task completes, or to a [`JoinError`]
/// if the task panicked or was cancelled.
///
/// Dropping a `JoinHandle` **does not** cancel the task. The task is
/// detached: it keeps running to completion in the background and its output
/// is silently discarded.
///
/// ```rust,ignore
/// let handle = strand::spawn(async { 40 + 2 });
/// assert_eq!(handle.await.unwrap(), 42);
/// ```
pub struct JoinHandle<T> {
    id: Id,
    slot: Arc<Slot<T>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(id: Id, slot: Arc<Slot<T>>) -> Self {
        Self { id, slot }
    }

    /// Returns the [`Id`] of the task this handle refers to.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns `true` if the task has produced its result, whether or not the
    /// result was already taken.
    pub fn is_finished(&self) -> bool {
        !matches!(self.slot.inner.lock().stage, Stage::Running)
    }

    /// Takes the task's result without waiting.
    ///
    /// Returns `None` while the task is still running, and after the result
    /// has been taken once.
    pub fn try_take(&mut self) -> Option<Result<T, JoinError>> {
        let mut inner = self.slot.inner.lock();

        match std::mem::replace(&mut inner.stage, Stage::Consumed) {
            Stage::Finished(result) => Some(result),
            other => {
                inner.stage = other;
                None
            }
        }
    }
}

impl<T> Future for JoinHandle<T> {
    /// The output of the spawned task, or why there is none.
    type Output = Result<T, JoinError>;

    /// Polls the join handle.
    ///
    /// If the task has already completed, its result is returned immediately.
    /// Otherwise the current waker is registered, replacing any earlier one,
    /// and the future returns `Poll::Pending`. Registration and the
    /// completion check happen under the same lock, so a completion racing
    /// with this poll cannot be missed.
    ///
    /// # Panics
    ///
    /// Panics if polled again after returning `Poll::Ready`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.slot.inner.lock();

        match std::mem::replace(&mut inner.stage, Stage::Consumed) {
            Stage::Finished(result) => Poll::Ready(result),
            Stage::Consumed => panic!("`JoinHandle` polled after completion"),
            Stage::Running => {
                inner.stage = Stage::Running;

                match &inner.waiter {
                    Some(waiter) if waiter.will_wake(cx.waker()) => {}
                    _ => inner.waiter = Some(cx.waker().clone()),
                }

                Poll::Pending
            }
        }
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}
