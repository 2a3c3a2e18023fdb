use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A child future of a join, or its output once it finished.
#[pin_project(project = MaybeDoneProj, project_replace = MaybeDoneReplace)]
pub(crate) enum MaybeDone<F: Future> {
    Future(#[pin] F),
    Done(F::Output),
    Gone,
}

impl<F: Future> MaybeDone<F> {
    pub(crate) fn new(future: F) -> Self {
        Self::Future(future)
    }

    /// Polls the child if it has not finished yet. Returns `true` once its
    /// output is stored.
    ///
    /// A finished child is never polled again.
    pub(crate) fn poll_done(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> bool {
        let output = match self.as_mut().project() {
            MaybeDoneProj::Future(future) => match future.poll(cx) {
                Poll::Ready(output) => output,
                Poll::Pending => return false,
            },
            MaybeDoneProj::Done(_) => return true,
            MaybeDoneProj::Gone => return false,
        };

        self.set(Self::Done(output));
        true
    }

    /// Moves the stored output out, leaving the slot `Gone`.
    pub(crate) fn take_output(self: Pin<&mut Self>) -> Option<F::Output> {
        if !matches!(*self, Self::Done(_)) {
            return None;
        }

        match self.project_replace(Self::Gone) {
            MaybeDoneReplace::Done(output) => Some(output),
            _ => None,
        }
    }

    pub(crate) fn is_gone(&self) -> bool {
        matches!(self, Self::Gone)
    }
}
