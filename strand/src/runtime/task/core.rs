use super::JoinHandle;
use super::handle::Slot;
use super::state::{self, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use super::{Id, JoinError};
use crate::runtime::context;
use crate::runtime::executor::Spawner;
use crate::runtime::task::waker::make_waker;

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tracing::{error, trace, warn};

/// A runnable unit of work that can be executed by the scheduler.
///
/// The `Runnable` trait erases the output type of a task, allowing the ready
/// queue to carry a heterogeneous collection of tasks as `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    /// Makes one progress attempt. Only ever called by the executor.
    fn run(self: Arc<Self>);

    /// ID of the task, for logging.
    fn id(&self) -> Id;
}

/// A spawned computation managed by the executor.
///
/// A `Task` is the pinned, reference-counted home of a future. It is shared
/// between the ready queue, the executor while polling, and every readiness
/// signal ([`Waker`](std::task::Waker)) derived from it. The future itself is
/// boxed once at spawn time and never moved again; it is dropped in place
/// when it completes, panics, or when the last reference to the task goes
/// away.
pub(crate) struct Task<T> {
    id: Id,

    /// The underlying future, `None` once it has completed.
    ///
    /// Only the executor locks this, and only while the task is `RUNNING`,
    /// so the lock is never contended.
    future: Mutex<Option<Pin<Box<dyn Future<Output = T> + Send>>>>,

    /// Current lifecycle state (IDLE, QUEUED, RUNNING, ...).
    state: AtomicUsize,

    /// Producer endpoints of the runtime that owns the task.
    spawner: Spawner,

    /// Completion slot shared with the task's `JoinHandle`.
    slot: Arc<Slot<T>>,
}

impl<T: Send + 'static> Task<T> {
    /// Creates a new task cell and its join handle.
    ///
    /// The task starts in the `QUEUED` state: the caller is expected to push
    /// it onto the ready queue exactly once.
    pub(crate) fn new<F>(future: F, spawner: Spawner) -> (Arc<Self>, JoinHandle<T>)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let id = Id::next();
        let slot = Arc::new(Slot::new());

        let task = Arc::new(Self {
            id,
            future: Mutex::new(Some(Box::pin(future))),
            state: AtomicUsize::new(QUEUED),
            spawner,
            slot: slot.clone(),
        });

        (task, JoinHandle::new(id, slot))
    }

    /// Performs one progress attempt.
    ///
    /// This method transitions the task to `RUNNING`, polls the inner future
    /// inside the task's runtime context, and handles the outcome:
    /// - `Poll::Pending`: back to `IDLE`, or re-queued if woken meanwhile.
    /// - `Poll::Ready`: the output is stored and the join handle notified.
    /// - panic: converted into a [`JoinError`] and stored the same way.
    pub(crate) fn run(self: Arc<Self>) {
        if self
            .state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!(
                task.id = %self.id,
                state = state::name(self.state.load(Ordering::Acquire)),
                "skipping stale queue entry"
            );
            return;
        }

        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        let outcome = {
            let _context = context::enter(self.spawner.clone(), self.id);
            let mut slot = self.future.lock();

            let Some(future) = slot.as_mut() else {
                // RUNNING is only reachable while the future is still present.
                unreachable!("task {} polled without a future", self.id);
            };

            trace!(task.id = %self.id, "poll");
            panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)))
        };

        match outcome {
            Ok(Poll::Pending) => {
                // Park unless a wake-up arrived during the attempt (NOTIFIED).
                if self
                    .state
                    .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    trace!(task.id = %self.id, "woken while running, re-queueing");
                    self.state.store(QUEUED, Ordering::Release);
                    self.spawner.queue().push(self.clone());
                }
            }
            Ok(Poll::Ready(output)) => {
                trace!(task.id = %self.id, "completed");
                self.finish(Ok(output));
            }
            Err(payload) => {
                let err = JoinError::panic(self.id, payload);
                error!(task.id = %self.id, error = %err, "task panicked");
                self.finish(Err(err));
            }
        }
    }

    /// Marks the task completed, drops the future in place and publishes the
    /// result to the join handle.
    ///
    /// A panic while dropping the future fails the task, unless it already
    /// failed.
    fn finish(&self, result: Result<T, JoinError>) {
        self.state.store(COMPLETED, Ordering::Release);

        // The future may wake its own task while being dropped; COMPLETED
        // turns that into a no-op.
        let future = self.future.lock().take();

        let result = match drop_isolated(self.id, future) {
            Ok(()) => result,
            Err(err) => match result {
                Ok(_) => Err(err),
                Err(first) => Err(first),
            },
        };

        self.slot.complete(result);
    }

    /// Signals the task to be rescheduled.
    ///
    /// If the task is `IDLE`, it moves to `QUEUED` and is pushed onto the
    /// ready queue. If it is `RUNNING`, it moves to `NOTIFIED` so it gets
    /// re-queued right after the current attempt. In every other state the
    /// wake-up is already covered (or moot) and nothing happens.
    pub(crate) fn wake_by_ref(self: &Arc<Self>) {
        loop {
            let current = self.state.load(Ordering::Acquire);

            match current {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        trace!(task.id = %self.id, "wake");

                        if !self.spawner.queue().push(self.clone()) {
                            trace!(task.id = %self.id, "wake after executor shutdown ignored");
                        }
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already queued, already notified, or finished.
                _ => return,
            }
        }
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::run(self)
    }

    fn id(&self) -> Id {
        self.id
    }
}

impl<T> Drop for Task<T> {
    /// Resolves the join handle with a cancellation if the task never got to
    /// complete.
    fn drop(&mut self) {
        if *self.state.get_mut() != COMPLETED {
            warn!(task.id = %self.id, "task dropped before completion");

            // Drop the future before publishing, like a normal completion.
            let _ = drop_isolated(self.id, self.future.get_mut().take());
            self.slot.complete(Err(JoinError::cancelled(self.id)));
        }
    }
}

/// Drops a task's future, catching a panic raised by its destructor so it
/// cannot unwind into the executor loop.
fn drop_isolated<F>(id: Id, future: Option<F>) -> Result<(), JoinError> {
    panic::catch_unwind(AssertUnwindSafe(move || drop(future))).map_err(|payload| {
        let err = JoinError::panic(id, payload);
        error!(task.id = %id, error = %err, "task panicked while being dropped");
        err
    })
}

/// Spawns a future onto the runtime whose task is currently being polled.
///
/// The returned [`JoinHandle`] resolves to the future's output. Dropping the
/// handle does **not** cancel the task: it keeps running in the background
/// and its output is discarded.
///
/// # Panics
///
/// Panics if called outside of a task, e.g. from plain synchronous code.
/// Use [`Spawner::spawn`] or [`Runtime::spawn`](crate::Runtime::spawn) there.
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let spawner =
        context::current_spawner().expect("spawn must be called within the context of a runtime");

    spawner.spawn(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::queue::{ReadyQueue, TryPop, ready_queue};
    use crate::test_utils::YieldTimes;

    use static_assertions::assert_impl_all;
    use std::future;

    assert_impl_all!(Task<u32>: Send, Sync);

    struct PanicOnDrop;

    impl Drop for PanicOnDrop {
        fn drop(&mut self) {
            panic!("destructor exploded");
        }
    }

    struct ReadyWithBomb {
        _bomb: PanicOnDrop,
    }

    impl Future for ReadyWithBomb {
        type Output = u8;

        fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<u8> {
            Poll::Ready(1)
        }
    }

    struct PendingWithBomb {
        _bomb: PanicOnDrop,
    }

    impl Future for PendingWithBomb {
        type Output = u8;

        fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<u8> {
            Poll::Pending
        }
    }

    type Single<T> = (Arc<Task<T>>, JoinHandle<T>, ReadyQueue);

    fn single_task<F>(future: F) -> Single<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (queue, ready) = ready_queue();
        let (task, handle) = Task::new(future, Spawner::new(queue, None));
        (task, handle, ready)
    }

    #[test]
    fn ready_future_completes_in_one_attempt() {
        let (task, mut handle, _ready) = single_task(future::ready(42));

        task.clone().run();

        assert_eq!(task.state.load(Ordering::Acquire), COMPLETED);
        assert!(task.future.lock().is_none());
        assert_eq!(handle.try_take(), Some(Ok(42)));
    }

    #[test]
    fn pending_then_self_wake_requeues_once() {
        let (task, handle, ready) = single_task(YieldTimes::new(1));

        task.clone().run();

        // The future woke itself while running: NOTIFIED -> QUEUED + one push.
        assert_eq!(task.state.load(Ordering::Acquire), QUEUED);
        let TryPop::Entry(entry) = ready.try_pop() else {
            panic!("task should have been re-queued");
        };
        assert!(matches!(ready.try_pop(), TryPop::Empty));

        entry.run();
        assert!(handle.is_finished());
    }

    #[test]
    fn duplicate_wakes_collapse_into_one_entry() {
        let (task, _handle, ready) = single_task(future::pending::<()>());

        task.clone().run();
        assert_eq!(task.state.load(Ordering::Acquire), IDLE);

        for _ in 0..5 {
            task.wake_by_ref();
        }

        assert!(matches!(ready.try_pop(), TryPop::Entry(_)));
        assert!(matches!(ready.try_pop(), TryPop::Empty));
    }

    #[test]
    fn wake_after_completion_is_a_no_op() {
        let (task, _handle, ready) = single_task(future::ready(()));

        task.clone().run();
        task.wake_by_ref();

        assert_eq!(task.state.load(Ordering::Acquire), COMPLETED);
        assert!(matches!(ready.try_pop(), TryPop::Empty));
    }

    #[test]
    fn stale_entries_are_skipped() {
        let (task, _handle, _ready) = single_task(future::ready(()));

        task.clone().run();
        // A second attempt on a completed task must not touch the future.
        task.clone().run();

        assert_eq!(task.state.load(Ordering::Acquire), COMPLETED);
    }

    #[test]
    fn panics_are_converted_into_join_errors() {
        let (task, mut handle, _ready) = single_task(async { panic!("boom") });

        task.clone().run();

        let err = handle.try_take().expect("finished").unwrap_err();
        assert!(err.is_panic());
        assert_eq!(err.id(), handle.id());
    }

    #[test]
    fn panicking_destructor_fails_the_completed_task() {
        let (task, mut handle, _ready) = single_task(ReadyWithBomb { _bomb: PanicOnDrop });

        task.clone().run();

        assert_eq!(task.state.load(Ordering::Acquire), COMPLETED);
        let err = handle.try_take().expect("finished").unwrap_err();
        assert!(err.is_panic());
        assert!(err.to_string().contains("destructor exploded"));
    }

    #[test]
    fn panicking_destructor_of_a_cancelled_task_is_contained() {
        let (task, mut handle, ready) = single_task(PendingWithBomb { _bomb: PanicOnDrop });

        task.clone().run();
        drop(ready);
        drop(task);

        assert!(handle.try_take().expect("finished").unwrap_err().is_cancelled());
    }

    #[test]
    fn dropping_a_pending_task_cancels_it() {
        let (task, mut handle, ready) = single_task(future::pending::<u8>());

        task.clone().run();
        drop(task);
        drop(ready);

        let err = handle.try_take().expect("finished").unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn wake_after_executor_is_gone_is_silent() {
        let (task, _handle, ready) = single_task(future::pending::<()>());

        task.clone().run();
        drop(ready);

        let waker = make_waker(task.clone());
        waker.wake_by_ref();
        drop(waker);

        // The push was refused, the task stays QUEUED and is never polled.
        assert_eq!(task.state.load(Ordering::Acquire), QUEUED);
    }
}
