use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by [`yield_now`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    /// On the first poll the task wakes itself and returns `Poll::Pending`,
    /// which puts it at the back of the ready queue. The second poll
    /// completes.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Yields execution back to the executor.
///
/// Every task queued before the current one gets a progress attempt before
/// the current task continues.
///
/// # Examples
///
/// ```rust,ignore
/// async fn busy() {
///     for chunk in work() {
///         process(chunk);
///         // Allow other tasks to run
///         strand::yield_now().await;
///     }
/// }
/// ```
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_executor_and_spawner;

    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn other_tasks_run_before_the_yielding_task_resumes() {
        let (executor, spawner) = new_executor_and_spawner();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = log.clone();
        spawner.spawn(async move {
            first.lock().push("a: before");
            yield_now().await;
            first.lock().push("a: after");
        });

        let second = log.clone();
        spawner.spawn(async move { second.lock().push("b") });

        drop(spawner);
        executor.run();

        assert_eq!(*log.lock(), ["a: before", "b", "a: after"]);
    }
}
