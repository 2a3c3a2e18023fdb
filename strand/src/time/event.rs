use parking_lot::Mutex;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

/// State shared by an [`Event`] and its [`Trigger`].
struct Shared {
    /// Set exactly once, by the first [`Trigger::fire`].
    fired: AtomicBool,

    /// Readiness signal of the task awaiting the event, and whether the
    /// [`Trigger`] is gone. Both change under the same lock.
    waker: Mutex<Parked>,
}

#[derive(Default)]
struct Parked {
    waker: Option<Waker>,
    orphaned: bool,
}

/// Creates a connected one-shot event source.
///
/// The [`Event`] half is a future that completes once the [`Trigger`] half
/// fires. The trigger can be moved to any thread (a timer, a callback, a
/// test) and fired from there.
///
/// ```rust,ignore
/// let (event, trigger) = strand::time::event();
///
/// std::thread::spawn(move || {
///     trigger.fire();
/// });
///
/// event.await;
/// ```
pub fn event() -> (Event, Trigger) {
    let shared = Arc::new(Shared {
        fired: AtomicBool::new(false),
        waker: Mutex::new(Parked::default()),
    });

    (
        Event {
            shared: shared.clone(),
        },
        Trigger { shared },
    )
}

/// Future half of a one-shot event source. See [`event`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Event {
    shared: Arc<Shared>,
}

impl Event {
    /// Returns `true` if the event has fired.
    pub fn is_fired(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }
}

impl Future for Event {
    type Output = ();

    /// Completes if the event has fired. Otherwise stores the current
    /// waker, replacing the previous one, and returns `Poll::Pending`.
    ///
    /// The flag is checked again after the waker is stored: a `fire` racing
    /// with this poll either sees the new waker or is seen by the re-check.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.is_fired() {
            return Poll::Ready(());
        }

        {
            let mut parked = self.shared.waker.lock();

            // Nothing can fire an orphaned event: keep no task reference, so
            // the task is released once its other wakers are gone.
            if parked.orphaned {
                return Poll::Pending;
            }

            match parked.waker.as_ref() {
                Some(current) if current.will_wake(cx.waker()) => {}
                _ => parked.waker = Some(cx.waker().clone()),
            }
        }

        if self.is_fired() {
            return Poll::Ready(());
        }

        Poll::Pending
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        // Release the task reference now rather than when the trigger goes.
        let waker = self.shared.waker.lock().waker.take();
        drop(waker);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// Firing half of a one-shot event source. See [`event`].
pub struct Trigger {
    shared: Arc<Shared>,
}

impl Trigger {
    /// Fires the event, waking the task awaiting it.
    ///
    /// Only the first call has an effect; it returns `true`. Later calls
    /// return `false`. Safe to call from any thread, and after the
    /// [`Event`] has been dropped.
    pub fn fire(&self) -> bool {
        if self.shared.fired.swap(true, Ordering::AcqRel) {
            return false;
        }

        let waker = self.shared.waker.lock().waker.take();
        if let Some(waker) = waker {
            waker.wake();
        }

        true
    }

    /// Returns `true` if the event has fired.
    pub fn is_fired(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// Returns `true` if the [`Event`] half has been dropped.
    pub(crate) fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.shared) == 1
    }
}

impl Drop for Trigger {
    /// Releases the parked waker of an event that can no longer fire.
    ///
    /// The waker is dropped outside the lock: it may hold the last reference
    /// to the awaiting task, whose future owns the [`Event`].
    fn drop(&mut self) {
        let waker = {
            let mut parked = self.shared.waker.lock();
            parked.orphaned = true;
            parked.waker.take()
        };

        drop(waker);
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("fired", &self.is_fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_executor_and_spawner;
    use crate::test_utils::counting_waker;

    use static_assertions::assert_impl_all;
    use std::pin::pin;
    use std::thread;

    assert_impl_all!(Event: Send, Sync, Unpin);
    assert_impl_all!(Trigger: Send, Sync);

    #[test]
    fn pending_before_fire_then_ready_once() {
        let (event, trigger) = event();
        let (waker, wakes) = counting_waker();
        let mut cx = Context::from_waker(&waker);
        let mut event = pin!(event);

        assert!(event.as_mut().poll(&mut cx).is_pending());
        assert!(event.as_mut().poll(&mut cx).is_pending());
        assert_eq!(wakes.count(), 0);

        assert!(trigger.fire());
        assert_eq!(wakes.count(), 1);

        assert!(event.as_mut().poll(&mut cx).is_ready());
    }

    #[test]
    fn repeated_fires_are_no_ops() {
        let (event, trigger) = event();
        let (waker, wakes) = counting_waker();
        let mut event = pin!(event);

        assert!(event.as_mut().poll(&mut Context::from_waker(&waker)).is_pending());

        assert!(trigger.fire());
        assert!(!trigger.fire());
        assert!(!trigger.fire());

        assert_eq!(wakes.count(), 1);
        assert!(trigger.is_fired());
    }

    #[test]
    fn fired_before_first_poll_is_ready_without_waking() {
        let (event, trigger) = event();
        let (waker, wakes) = counting_waker();

        trigger.fire();

        let mut event = pin!(event);
        assert!(event.as_mut().poll(&mut Context::from_waker(&waker)).is_ready());
        assert_eq!(wakes.count(), 0);
    }

    #[test]
    fn only_the_latest_waker_is_woken() {
        let (event, trigger) = event();
        let (first, first_wakes) = counting_waker();
        let (second, second_wakes) = counting_waker();
        let mut event = pin!(event);

        assert!(event.as_mut().poll(&mut Context::from_waker(&first)).is_pending());
        assert!(event.as_mut().poll(&mut Context::from_waker(&second)).is_pending());

        trigger.fire();

        assert_eq!(first_wakes.count(), 0);
        assert_eq!(second_wakes.count(), 1);
    }

    #[test]
    fn dropping_the_event_releases_the_waker() {
        let (event, trigger) = event();
        let (waker, wakes) = counting_waker();
        let mut event = Box::pin(event);

        assert!(event.as_mut().poll(&mut Context::from_waker(&waker)).is_pending());
        drop(event);

        assert!(trigger.is_abandoned());
        assert!(trigger.fire());
        assert_eq!(wakes.count(), 0);
    }

    #[test]
    fn dropping_the_trigger_releases_the_waker() {
        let (event, trigger) = event();
        let (waker, wakes) = counting_waker();
        let mut event = pin!(event);

        // Held by `waker`, `wakes` and the clone parked in the event.
        assert!(event.as_mut().poll(&mut Context::from_waker(&waker)).is_pending());
        assert_eq!(Arc::strong_count(&wakes), 3);

        drop(trigger);
        assert_eq!(Arc::strong_count(&wakes), 2);

        // Polling an orphaned event parks nothing.
        assert!(event.as_mut().poll(&mut Context::from_waker(&waker)).is_pending());
        assert_eq!(Arc::strong_count(&wakes), 2);
        assert_eq!(wakes.count(), 0);
    }

    #[test]
    fn task_parked_on_an_orphaned_event_is_cancelled() {
        let (executor, spawner) = new_executor_and_spawner();
        let (event, trigger) = event();
        let mut handle = spawner.spawn(event);
        drop(spawner);

        assert_eq!(executor.run_until_idle(), 1);
        assert!(!executor.is_drained());

        drop(trigger);

        assert!(executor.is_drained());
        executor.run();
        assert!(handle.try_take().expect("resolved").unwrap_err().is_cancelled());
    }

    #[test]
    fn fire_from_another_thread() {
        let (event, trigger) = event();

        thread::spawn(move || trigger.fire())
            .join()
            .expect("firing thread panicked");

        assert!(event.is_fired());
    }
}
