use super::executor::{Executor, Spawner};
use crate::task::JoinHandle;

use std::fmt;
use std::panic;
use std::thread;
use tracing::{debug, warn};

/// The main runtime handle.
///
/// `Runtime` bundles:
/// - an [`Executor`], the single-threaded scheduler loop,
/// - a [`Spawner`] connected to it,
/// - optionally, the background timer driver thread used by
///   [`sleep`](crate::time::sleep).
///
/// The usual entry point is [`block_on`](Self::block_on), which consumes the
/// runtime and runs it until every task it knows about is finished.
pub struct Runtime {
    /// Task executor responsible for scheduling and running futures.
    executor: Executor,

    /// The runtime's own producer endpoint.
    spawner: Spawner,

    /// Timer driver thread, if the timer is enabled.
    driver: Option<thread::JoinHandle<()>>,
}

impl Runtime {
    pub(crate) fn new(
        executor: Executor,
        spawner: Spawner,
        driver: Option<thread::JoinHandle<()>>,
    ) -> Self {
        Self {
            executor,
            spawner,
            driver,
        }
    }

    /// Returns a new handle for submitting tasks to this runtime.
    ///
    /// Note that every live `Spawner` keeps the runtime's executor running
    /// once [`block_on`](Self::block_on) is called.
    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task makes no progress until the executor runs, typically through
    /// [`block_on`](Self::block_on).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let runtime = strand::Builder::new().build();
    /// let handle = runtime.spawn(async { 7 });
    /// runtime.block_on(async move { assert_eq!(handle.await.unwrap(), 7) });
    /// ```
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.spawner.spawn(future)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// The future becomes the root task. The executor then runs until its
    /// ready queue is drained, which means every other task spawned on the
    /// runtime (including detached ones) gets to finish too. The timer driver
    /// thread is joined before returning.
    ///
    /// Any [`Spawner`] obtained from this runtime and still alive keeps the
    /// executor waiting for more work.
    ///
    /// # Panics
    ///
    /// If the root future panics, the panic is resumed on the calling thread
    /// once the executor has stopped. Panics too if the root task is
    /// cancelled, i.e. stalled with no readiness signal left to revive it.
    pub fn block_on<F>(self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let Self {
            executor,
            spawner,
            driver,
        } = self;

        let mut root = spawner.spawn(future);
        debug!(task.id = %root.id(), "block_on");

        // The root task and its wakers now hold the queue open on their own.
        drop(spawner);
        executor.run();

        if let Some(driver) = driver
            && driver.join().is_err()
        {
            warn!("timer driver thread panicked");
        }

        match root.try_take() {
            Some(Ok(output)) => output,
            Some(Err(err)) if err.is_panic() => panic::resume_unwind(Box::new(err.to_string())),
            Some(Err(err)) => panic!("block_on: {err}"),
            None => unreachable!("root task outlived its executor"),
        }
    }

    /// Splits the runtime into its executor and a connected spawner.
    ///
    /// This lets callers drive the scheduler loop themselves, with
    /// [`Executor::run`] or step by step with [`Executor::run_until_idle`].
    ///
    /// The timer driver, if any, is detached: it exits by itself once every
    /// spawner and every pending timer is gone.
    pub fn into_parts(self) -> (Executor, Spawner) {
        (self.executor, self.spawner)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("executor", &self.executor)
            .field("timer", &self.driver.is_some())
            .finish()
    }
}
