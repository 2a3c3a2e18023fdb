use crate::runtime::queue::QueueHandle;
use crate::runtime::task::{JoinHandle, Task};
use crate::time::driver::TimerHandle;

use std::fmt;
use tracing::{debug, trace};

/// Producer-side handle used to submit new top-level tasks.
///
/// A `Spawner` is cheap to clone and can be shared across threads. Every
/// clone keeps the executor's ready queue open: the executor only stops once
/// all spawners (and all outstanding wakers) are gone.
#[derive(Clone)]
pub struct Spawner {
    /// Producer endpoint of the ready queue.
    queue: QueueHandle,

    /// Timer driver of the runtime, if it runs one.
    timer: Option<TimerHandle>,
}

impl Spawner {
    pub(crate) fn new(queue: QueueHandle, timer: Option<TimerHandle>) -> Self {
        Self { queue, timer }
    }

    /// Spawns a future as a new task.
    ///
    /// The future is moved to the heap once, pinned there for its whole
    /// life, and queued for a first progress attempt. The returned
    /// [`JoinHandle`] resolves to its output.
    ///
    /// Dropping the `JoinHandle` does **not** cancel the task; it keeps
    /// running in the background and its output is discarded.
    ///
    /// Spawning onto an executor that has already been dropped yields a
    /// handle that resolves to a cancelled [`JoinError`](crate::task::JoinError).
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (task, handle) = Task::new(future, self.clone());

        trace!(task.id = %handle.id(), "spawn");

        if !self.queue.push(task) {
            debug!(task.id = %handle.id(), "spawned onto a stopped executor");
        }

        handle
    }

    pub(crate) fn queue(&self) -> &QueueHandle {
        &self.queue
    }

    pub(crate) fn timer(&self) -> Option<&TimerHandle> {
        self.timer.as_ref()
    }
}

impl fmt::Debug for Spawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spawner")
            .field("timer", &self.timer.is_some())
            .finish()
    }
}
