use super::event::{Event, Trigger, event};
use crate::runtime::context;

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};
use tracing::trace;

/// Creates a future that completes after the given duration.
///
/// Inside a runtime with a timer driver, the sleep is registered with the
/// driver on first poll. Anywhere else it is served by a dedicated sleeper
/// thread.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    sleep_until(Instant::now() + duration)
}

/// Creates a future that completes once `deadline` is reached.
pub fn sleep_until(deadline: Instant) -> Sleep {
    let (event, trigger) = event();

    Sleep {
        deadline,
        event,
        trigger: Some(trigger),
    }
}

/// A future that completes once a specific deadline is reached.
///
/// `Sleep` is an [`Event`] whose trigger is handed to a timer on first poll.
/// Dropping it before completion is fine: the timer still fires later, but
/// nobody is woken.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    event: Event,

    /// Trigger not yet handed to a timer, `None` once registered.
    trigger: Option<Trigger>,
}

impl Sleep {
    /// Returns the instant at which the sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns `true` once the deadline has been reached.
    pub fn is_elapsed(&self) -> bool {
        self.event.is_fired() || Instant::now() >= self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.is_elapsed() {
            return Poll::Ready(());
        }

        let this = &mut *self;

        // Arm the event before the timer can fire it.
        if Pin::new(&mut this.event).poll(cx).is_ready() {
            return Poll::Ready(());
        }

        if let Some(trigger) = this.trigger.take() {
            register(this.deadline, trigger);
        }

        Poll::Pending
    }
}

impl fmt::Debug for Sleep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sleep")
            .field("deadline", &self.deadline)
            .field("registered", &self.trigger.is_none())
            .finish()
    }
}

/// Hands `trigger` to the current runtime's timer driver, or to a sleeper
/// thread when there is none.
fn register(deadline: Instant, trigger: Trigger) {
    let trigger = match context::current_timer() {
        Some(timer) => match timer.register(deadline, trigger) {
            Ok(()) => return,
            Err(trigger) => trigger,
        },
        None => trigger,
    };

    trace!("no timer driver, falling back to a sleeper thread");

    let spawned = thread::Builder::new()
        .name("strand-sleeper".to_owned())
        .spawn(move || {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
            trigger.fire();
        });

    if let Err(err) = spawned {
        panic!("failed to spawn sleeper thread: {err}");
    }
}
