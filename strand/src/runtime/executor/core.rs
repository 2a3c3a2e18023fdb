use crate::runtime::queue::{Entry, ReadyQueue, TryPop};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info_span, trace_span};

/// Single-threaded task executor.
///
/// The `Executor` is the only consumer of its ready queue. It repeatedly
/// takes the task at the front of the queue and makes one progress attempt
/// on it. A task that completes is released; a task that returns
/// `Poll::Pending` is simply not re-queued: it is the task's own job to have
/// armed a readiness signal before suspending.
///
/// Only one poll is ever in flight. Parallelism, if any, lives in the
/// producers: spawners and wakers may push onto the queue from any thread.
///
/// The executor stops on its own once the queue is drained, i.e. empty with
/// every [`Spawner`](crate::Spawner) and every outstanding waker dropped.
pub struct Executor {
    /// Consumer endpoint of the ready queue.
    queue: ReadyQueue,

    /// Name recorded on the executor's tracing span.
    name: Arc<str>,
}

impl Executor {
    pub(crate) fn new(queue: ReadyQueue, name: Arc<str>) -> Self {
        Self { queue, name }
    }

    /// Runs tasks until the ready queue is drained.
    ///
    /// Blocks the current thread while the queue is empty but producers are
    /// still alive; a readiness signal fired from another thread wakes it up.
    /// Returns once no spawner and no waker is left that could ever enqueue
    /// another task.
    ///
    /// A panicking task does not stop the loop: the panic is delivered to the
    /// task's [`JoinHandle`](crate::task::JoinHandle) instead.
    pub fn run(self) {
        let span = info_span!("executor", name = %self.name);
        let _enter = span.enter();

        debug!("executor started");

        let mut attempts: u64 = 0;
        while let Some(task) = self.queue.pop() {
            attempt(task);
            attempts += 1;
        }

        debug!(attempts, "ready queue drained, executor stopped");
    }

    /// Runs every task that is ready right now, without blocking.
    ///
    /// Tasks re-queued during this call (for example by waking themselves)
    /// are run too. Returns the number of progress attempts made, which makes
    /// it handy for stepping a computation in tests.
    pub fn run_until_idle(&self) -> usize {
        let span = info_span!("executor", name = %self.name);
        let _enter = span.enter();

        let mut attempts = 0;
        while let TryPop::Entry(task) = self.queue.try_pop() {
            attempt(task);
            attempts += 1;
        }

        attempts
    }

    /// Returns `true` if the ready queue is drained: nothing is queued and no
    /// producer endpoint is left.
    ///
    /// A queued entry found while checking is run rather than lost.
    pub fn is_drained(&self) -> bool {
        match self.queue.try_pop() {
            TryPop::Drained => true,
            TryPop::Empty => false,
            TryPop::Entry(task) => {
                attempt(task);
                false
            }
        }
    }
}

/// Makes one progress attempt on a dequeued task.
fn attempt(task: Entry) {
    let span = trace_span!("task", task.id = %task.id());
    let _enter = span.enter();

    task.run();
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor").field("name", &self.name).finish()
    }
}
