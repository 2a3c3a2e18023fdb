use pin_project::pin_project;
use std::ops::DerefMut;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Wraps a future so it can be polled after completion.
///
/// Once the inner future has returned `Poll::Ready`, it is dropped and every
/// later poll returns `Poll::Pending`. Handy for loops that keep polling a
/// set of futures where some may already be done.
pub fn fuse<F: Future>(future: F) -> Fuse<F> {
    Fuse {
        inner: Some(future),
    }
}

/// Future returned by [`fuse`].
#[pin_project]
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Fuse<F> {
    #[pin]
    inner: Option<F>,
}

impl<F> Fuse<F> {
    /// Creates a `Fuse` that is already terminated.
    ///
    /// Useful as a placeholder in a `select!` loop: the slot stays idle until
    /// a real future is put in with [`Pin::set`].
    pub fn terminated() -> Self {
        Fuse { inner: None }
    }

    /// Returns `true` once the inner future has completed.
    pub fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}

/// A future that knows when it must no longer be polled.
///
/// `select!` uses it to take its `complete` branch once every branch is
/// terminated.
pub trait FusedFuture: Future {
    /// Returns `true` if polling the future again would be pointless.
    fn is_terminated(&self) -> bool;
}

impl<F: Future> FusedFuture for Fuse<F> {
    fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}

impl<F: FusedFuture + Unpin + ?Sized> FusedFuture for &mut F {
    fn is_terminated(&self) -> bool {
        F::is_terminated(&**self)
    }
}

impl<P> FusedFuture for Pin<P>
where
    P: DerefMut<Target: FusedFuture>,
{
    fn is_terminated(&self) -> bool {
        <P::Target as FusedFuture>::is_terminated(&**self)
    }
}

impl<F: Future> Future for Fuse<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        let Some(inner) = this.inner.as_mut().as_pin_mut() else {
            return Poll::Pending;
        };

        let output = match inner.poll(cx) {
            Poll::Ready(output) => output,
            Poll::Pending => return Poll::Pending,
        };

        this.inner.set(None);
        Poll::Ready(output)
    }
}
