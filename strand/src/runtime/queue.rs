use crate::runtime::task::Runnable;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// One ready-queue entry: a shared handle to a task cell.
///
/// The cell carries its own [`QueueHandle`], so an entry is all a readiness
/// signal needs to put the task back on the queue.
pub(crate) type Entry = Arc<dyn Runnable>;

/// Creates a connected producer/consumer pair for a new executor.
pub(crate) fn ready_queue() -> (QueueHandle, ReadyQueue) {
    let (sender, receiver) = mpsc::channel();

    (QueueHandle { sender }, ReadyQueue { receiver })
}

/// Producer endpoint of the ready queue.
///
/// Cloned into every spawner and every task cell. Pushing never blocks. The
/// queue stays open for as long as at least one clone is alive.
#[derive(Clone)]
pub(crate) struct QueueHandle {
    sender: Sender<Entry>,
}

impl QueueHandle {
    /// Appends an entry to the back of the queue.
    ///
    /// Returns `false` when the executor owning the consumer side is gone.
    /// The entry is dropped in that case.
    pub(crate) fn push(&self, entry: Entry) -> bool {
        self.sender.send(entry).is_ok()
    }
}

/// Result of a non-blocking dequeue.
pub(crate) enum TryPop {
    /// The entry at the front of the queue.
    Entry(Entry),

    /// Nothing queued right now, but producers are still alive.
    Empty,

    /// Nothing queued and every producer endpoint has been dropped.
    Drained,
}

/// Consumer endpoint of the ready queue, owned by exactly one executor.
pub(crate) struct ReadyQueue {
    receiver: Receiver<Entry>,
}

impl ReadyQueue {
    /// Removes the entry at the front of the queue, blocking the current
    /// thread while the queue is empty.
    ///
    /// Returns `None` once the queue is drained: empty with no producer left
    /// that could ever push again.
    pub(crate) fn pop(&self) -> Option<Entry> {
        self.receiver.recv().ok()
    }

    /// Removes the entry at the front of the queue without blocking.
    pub(crate) fn try_pop(&self) -> TryPop {
        match self.receiver.try_recv() {
            Ok(entry) => TryPop::Entry(entry),
            Err(TryRecvError::Empty) => TryPop::Empty,
            Err(TryRecvError::Disconnected) => TryPop::Drained,
        }
    }
}
