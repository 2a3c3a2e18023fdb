use super::maybe_done::MaybeDone;

use pin_project::pin_project;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Runs two futures concurrently and waits for both.
///
/// On every poll, each child that has not finished yet is polled, `a` first.
/// Finished outputs are kept aside, and the join resolves to `(a, b)` once
/// both are done. A child is never polled again after it completed.
///
/// ```rust,ignore
/// let (left, right) = strand::future::join(fetch_left(), fetch_right()).await;
/// ```
pub fn join<A, B>(a: A, b: B) -> Join<A, B>
where
    A: Future,
    B: Future,
{
    Join {
        a: MaybeDone::new(a),
        b: MaybeDone::new(b),
    }
}

/// Future returned by [`join`].
#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Join<A: Future, B: Future> {
    #[pin]
    a: MaybeDone<A>,
    #[pin]
    b: MaybeDone<B>,
}

impl<A: Future, B: Future> Future for Join<A, B> {
    type Output = (A::Output, B::Output);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        if this.a.is_gone() {
            panic!("`Join` polled after completion");
        }

        let a_done = this.a.as_mut().poll_done(cx);
        let b_done = this.b.as_mut().poll_done(cx);

        if !(a_done && b_done) {
            return Poll::Pending;
        }

        match (this.a.take_output(), this.b.take_output()) {
            (Some(a), Some(b)) => Poll::Ready((a, b)),
            _ => unreachable!("both children reported done"),
        }
    }
}

impl<A: Future, B: Future> fmt::Debug for Join<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Join").finish_non_exhaustive()
    }
}
