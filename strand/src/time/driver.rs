//! Background timer driver.
//!
//! A single thread owns a min-heap of pending deadlines and fires the
//! matching [`Trigger`]s as they expire. Sleeps register with it through a
//! cloneable [`TimerHandle`]; the thread exits on its own once every handle
//! is gone and no live timer is left.

use super::event::Trigger;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Instant;
use tracing::{debug, trace};

/// An entry in the timer heap.
///
/// `TimerEntry` represents a scheduled fire at a specific deadline. It is
/// stored inside a `BinaryHeap` ordered by deadline.
struct TimerEntry {
    /// The time at which the trigger should fire.
    deadline: Instant,

    /// Fired when the deadline is reached.
    trigger: Trigger,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    /// Two timer entries are equal if their deadlines are equal.
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline.
    ///
    /// Note that the comparison is **reversed** so that a
    /// `BinaryHeap<TimerEntry>` behaves as a min-heap, where the earliest
    /// deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Handle used to register timers with a running driver.
#[derive(Clone)]
pub(crate) struct TimerHandle {
    sender: Sender<TimerEntry>,
}

impl TimerHandle {
    /// Asks the driver to fire `trigger` at `deadline`.
    ///
    /// Hands the trigger back if the driver thread is gone.
    pub(crate) fn register(&self, deadline: Instant, trigger: Trigger) -> Result<(), Trigger> {
        self.sender
            .send(TimerEntry { deadline, trigger })
            .map_err(|err| err.0.trigger)
    }
}

/// Spawns the driver thread.
pub(crate) fn start(name: &str) -> io::Result<(TimerHandle, thread::JoinHandle<()>)> {
    let (sender, receiver) = mpsc::channel();

    let thread = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || run(receiver))?;

    Ok((TimerHandle { sender }, thread))
}

/// Heap size at which abandoned entries are first swept out.
const PRUNE_THRESHOLD: usize = 64;

/// Pending timers, earliest deadline first.
struct Timers {
    heap: BinaryHeap<TimerEntry>,

    /// Size at which the next sweep of abandoned entries happens.
    prune_at: usize,
}

impl Timers {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            prune_at: PRUNE_THRESHOLD,
        }
    }

    /// Adds a timer. Sweeps abandoned entries when the heap has doubled
    /// since the last sweep.
    fn insert(&mut self, entry: TimerEntry) {
        self.heap.push(entry);

        if self.heap.len() >= self.prune_at {
            self.prune();
        }
    }

    /// Drops every entry whose [`Event`](super::Event) is gone.
    fn prune(&mut self) {
        let before = self.heap.len();
        self.heap.retain(|entry| !entry.trigger.is_abandoned());
        self.prune_at = (self.heap.len() * 2).max(PRUNE_THRESHOLD);

        trace!(removed = before - self.heap.len(), "pruned abandoned timers");
    }

    /// Fires every timer whose deadline is at or before `now`.
    fn fire_expired(&mut self, now: Instant) {
        while self.heap.peek().is_some_and(|entry| entry.deadline <= now) {
            if let Some(entry) = self.heap.pop() {
                trace!("timer fired");
                entry.trigger.fire();
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.deadline)
    }
}

/// Driver thread main loop.
fn run(receiver: Receiver<TimerEntry>) {
    debug!("timer driver started");

    let mut timers = Timers::new();
    let mut connected = true;

    loop {
        let now = Instant::now();
        timers.fire_expired(now);

        if !connected {
            // Nobody can register anymore; only timers someone still
            // awaits are worth waiting for.
            timers.prune();
        }

        let Some(next) = timers.next_deadline() else {
            if !connected {
                break;
            }

            match receiver.recv() {
                Ok(entry) => timers.insert(entry),
                Err(_) => break,
            }
            continue;
        };

        let wait = next.saturating_duration_since(now);

        if !connected {
            thread::sleep(wait);
            continue;
        }

        match receiver.recv_timeout(wait) {
            Ok(entry) => timers.insert(entry),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => connected = false,
        }
    }

    debug!("timer driver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::event;

    use std::time::Duration;

    #[test]
    fn fires_in_deadline_order() {
        let (timer, driver) = start("timer-test").expect("spawn timer thread");
        let now = Instant::now();

        let (late, late_trigger) = event();
        let (early, early_trigger) = event();

        assert!(timer.register(now + Duration::from_millis(300), late_trigger).is_ok());
        assert!(timer.register(now + Duration::from_millis(10), early_trigger).is_ok());

        thread::sleep(Duration::from_millis(100));
        assert!(early.is_fired());
        assert!(!late.is_fired());

        drop(timer);
        driver.join().expect("timer thread panicked");

        // The live timer was still served after the last handle went away.
        assert!(late.is_fired());
    }

    #[test]
    fn expired_deadline_fires_immediately() {
        let (timer, driver) = start("timer-test").expect("spawn timer thread");
        let (event, trigger) = event();

        assert!(timer.register(Instant::now(), trigger).is_ok());
        drop(timer);
        driver.join().expect("timer thread panicked");

        assert!(event.is_fired());
    }

    #[test]
    fn exits_without_waiting_for_abandoned_timers() {
        let (timer, driver) = start("timer-test").expect("spawn timer thread");
        let (event, trigger) = event();

        assert!(timer.register(Instant::now() + Duration::from_secs(3600), trigger).is_ok());
        drop(event);
        drop(timer);

        // Would block for an hour if the abandoned entry were kept.
        driver.join().expect("timer thread panicked");
    }

    #[test]
    fn abandoned_timers_are_swept_while_running() {
        let mut timers = Timers::new();
        let far = Instant::now() + Duration::from_secs(3600);

        let (live, trigger) = event();
        timers.insert(TimerEntry { deadline: far, trigger });

        for _ in 1..PRUNE_THRESHOLD {
            let (gone, trigger) = event();
            drop(gone);
            timers.insert(TimerEntry { deadline: far, trigger });
        }

        assert_eq!(timers.heap.len(), 1);
        assert_eq!(timers.prune_at, PRUNE_THRESHOLD);
        assert!(!live.is_fired());
    }

    #[test]
    fn sweep_threshold_grows_with_live_timers() {
        let mut timers = Timers::new();
        let far = Instant::now() + Duration::from_secs(3600);
        let mut live = Vec::new();

        for _ in 0..PRUNE_THRESHOLD {
            let (event, trigger) = event();
            live.push(event);
            timers.insert(TimerEntry { deadline: far, trigger });
        }

        // Nothing to sweep, so the next sweep waits for twice as many.
        assert_eq!(timers.heap.len(), PRUNE_THRESHOLD);
        assert_eq!(timers.prune_at, 2 * PRUNE_THRESHOLD);
    }
}
