use std::pin::Pin;
use std::task::{Context, Poll};

/// One of two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L, R> Either<L, R> {
    /// Returns `true` if this is the `Left` variant.
    pub fn is_left(&self) -> bool {
        matches!(self, Self::Left(_))
    }

    /// Returns `true` if this is the `Right` variant.
    pub fn is_right(&self) -> bool {
        matches!(self, Self::Right(_))
    }
}

/// Waits for the first of two futures to complete.
///
/// `a` is polled before `b` on every attempt, so `a` wins when both are
/// ready. The losing future is handed back unfinished, which lets the caller
/// keep driving it (or drop it to give up on it).
///
/// Both futures must be [`Unpin`]; pin them with [`Box::pin`] or
/// [`std::pin::pin!`] first if they are not.
///
/// ```rust,ignore
/// match select(pin!(request), sleep(deadline)).await {
///     Either::Left((reply, _timer)) => handle(reply),
///     Either::Right(((), request)) => give_up(request),
/// }
/// ```
pub fn select<A, B>(a: A, b: B) -> Select<A, B>
where
    A: Future + Unpin,
    B: Future + Unpin,
{
    Select {
        inner: Some((a, b)),
    }
}

/// Future returned by [`select`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Select<A, B> {
    inner: Option<(A, B)>,
}

impl<A, B> Future for Select<A, B>
where
    A: Future + Unpin,
    B: Future + Unpin,
{
    type Output = Either<(A::Output, B), (B::Output, A)>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some((mut a, mut b)) = self.inner.take() else {
            panic!("`Select` polled after completion");
        };

        if let Poll::Ready(output) = Pin::new(&mut a).poll(cx) {
            return Poll::Ready(Either::Left((output, b)));
        }

        if let Poll::Ready(output) = Pin::new(&mut b).poll(cx) {
            return Poll::Ready(Either::Right((output, a)));
        }

        self.inner = Some((a, b));
        Poll::Pending
    }
}
