use super::sleep::{Sleep, sleep};

use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Error returned by [`Timeout`] when the deadline passes first.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline has elapsed")]
pub struct Elapsed(());

/// Requires a future to complete before `duration` has elapsed.
///
/// Resolves to `Ok(output)` if `future` completes in time, or to
/// `Err(Elapsed)` otherwise, in which case `future` is dropped unfinished.
///
/// # Examples
///
/// ```rust,ignore
/// match timeout(Duration::from_millis(50), fetch()).await {
///     Ok(reply) => handle(reply),
///     Err(_) => retry(),
/// }
/// ```
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout {
        future,
        sleep: sleep(duration),
    }
}

/// Future returned by [`timeout`].
#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
#[derive(Debug)]
pub struct Timeout<F> {
    #[pin]
    future: F,
    sleep: Sleep,
}

impl<F> Timeout<F> {
    /// Returns a reference to the wrapped future.
    pub fn get_ref(&self) -> &F {
        &self.future
    }

    /// Consumes the `Timeout`, returning the wrapped future.
    pub fn into_inner(self) -> F {
        self.future
    }
}

impl<F> Future for Timeout<F>
where
    F: Future,
{
    type Output = Result<F::Output, Elapsed>;

    /// Polls the wrapped future first, so a future that is ready exactly at
    /// the deadline still wins.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(output) = this.future.poll(cx) {
            return Poll::Ready(Ok(output));
        }

        match Pin::new(this.sleep).poll(cx) {
            Poll::Ready(()) => Poll::Ready(Err(Elapsed(()))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Builder;

    use std::future;

    #[test]
    fn completes_in_time() {
        let runtime = Builder::new().build();

        let result = runtime.block_on(timeout(Duration::from_secs(5), async { 3 }));

        assert_eq!(result, Ok(3));
    }

    #[test]
    fn elapses_on_a_stalled_future() {
        let runtime = Builder::new().build();

        let result = runtime.block_on(timeout(
            Duration::from_millis(20),
            future::pending::<()>(),
        ));

        assert_eq!(result, Err(Elapsed(())));
        assert_eq!(Elapsed(()).to_string(), "deadline has elapsed");
    }

    #[test]
    fn ready_future_wins_over_an_expired_deadline() {
        let runtime = Builder::new().enable_timer(false).build();

        let result = runtime.block_on(timeout(Duration::ZERO, future::ready("on time")));

        assert_eq!(result, Ok("on time"));
    }
}
