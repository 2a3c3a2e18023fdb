use pin_project::pin_project;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

/// Runs `first`, then the future `f` builds from its output.
///
/// The second future does not exist until the first one completes. Moving
/// from one stage to the next is a yield point: the chain wakes its own task
/// and returns `Poll::Pending`, so the second stage starts on the next
/// progress attempt and other ready tasks get to run in between.
///
/// ```rust,ignore
/// let body = chain(connect(addr), |stream| read_to_end(stream)).await;
/// ```
pub fn chain<A, F, B>(first: A, f: F) -> Chain<A, F, B>
where
    A: Future,
    F: FnOnce(A::Output) -> B,
    B: Future,
{
    Chain {
        stage: Stage::First(first),
        then: Some(f),
    }
}

#[pin_project(project = StageProj)]
enum Stage<A, B> {
    First(#[pin] A),
    Second(#[pin] B),
    Done,
}

/// Future returned by [`chain`].
#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Chain<A, F, B> {
    #[pin]
    stage: Stage<A, B>,

    /// Continuation, consumed when the first stage completes.
    then: Option<F>,
}

impl<A, F, B> Future for Chain<A, F, B>
where
    A: Future,
    F: FnOnce(A::Output) -> B,
    B: Future,
{
    type Output = B::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        match this.stage.as_mut().project() {
            StageProj::First(first) => {
                let output = ready!(first.poll(cx));
                let Some(then) = this.then.take() else {
                    unreachable!("`Chain` continuation already consumed");
                };

                this.stage.set(Stage::Second(then(output)));

                cx.waker().wake_by_ref();
                Poll::Pending
            }
            StageProj::Second(second) => {
                let output = ready!(second.poll(cx));
                this.stage.set(Stage::Done);
                Poll::Ready(output)
            }
            StageProj::Done => panic!("`Chain` polled after completion"),
        }
    }
}

impl<A, F, B> fmt::Debug for Chain<A, F, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            Stage::First(_) => "first",
            Stage::Second(_) => "second",
            Stage::Done => "done",
        };

        f.debug_struct("Chain").field("stage", &stage).finish()
    }
}
