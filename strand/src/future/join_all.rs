use super::maybe_done::MaybeDone;

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Runs a collection of futures concurrently and waits for all of them.
///
/// Works like [`join`](super::join) for any number of futures of the same
/// type. The outputs are returned in input order. An empty collection
/// resolves immediately to an empty `Vec`.
pub fn join_all<I>(futures: I) -> JoinAll<I::Item>
where
    I: IntoIterator,
    I::Item: Future,
{
    JoinAll {
        children: futures
            .into_iter()
            .map(|future| Box::pin(MaybeDone::new(future)))
            .collect(),
        done: false,
    }
}

/// Future returned by [`join_all`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct JoinAll<F: Future> {
    /// Each child pinned in its own allocation.
    children: Vec<Pin<Box<MaybeDone<F>>>>,
    done: bool,
}

impl<F: Future> Future for JoinAll<F> {
    type Output = Vec<F::Output>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        assert!(!self.done, "`JoinAll` polled after completion");

        let mut all_done = true;
        for child in self.children.iter_mut() {
            all_done &= child.as_mut().poll_done(cx);
        }

        if !all_done {
            return Poll::Pending;
        }

        self.done = true;
        Poll::Ready(
            self.children
                .iter_mut()
                .filter_map(|child| child.as_mut().take_output())
                .collect(),
        )
    }
}

impl<F: Future> fmt::Debug for JoinAll<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinAll")
            .field("len", &self.children.len())
            .field("done", &self.done)
            .finish()
    }
}
