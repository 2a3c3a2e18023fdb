use crate::runtime::executor::Spawner;
use crate::task::Id;
use crate::time::driver::TimerHandle;

use std::cell::RefCell;

thread_local! {
    /// Runtime context of the task currently being polled on this thread.
    ///
    /// Installed by the executor for the duration of a single progress
    /// attempt and removed right after, so the context never keeps a ready
    /// queue open on its own.
    static CURRENT: RefCell<Option<Current>> = const { RefCell::new(None) };
}

struct Current {
    /// Spawner of the runtime that owns the task.
    spawner: Spawner,

    /// ID of the task being polled.
    task: Id,
}

/// Restores the previous context when dropped, including while unwinding.
pub(crate) struct ContextGuard {
    previous: Option<Current>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|cell| {
            cell.replace(previous);
        });
    }
}

/// Installs `spawner` and `task` as the current runtime context until the
/// returned guard is dropped.
///
/// Nested entries are allowed; the previous context is restored on exit.
pub(crate) fn enter(spawner: Spawner, task: Id) -> ContextGuard {
    let previous = CURRENT.with(|cell| cell.replace(Some(Current { spawner, task })));

    ContextGuard { previous }
}

/// Returns a clone of the current spawner, if a task is being polled.
pub(crate) fn current_spawner() -> Option<Spawner> {
    CURRENT.with(|cell| cell.borrow().as_ref().map(|c| c.spawner.clone()))
}

/// Returns the ID of the task being polled, if any.
pub(crate) fn current_task_id() -> Option<Id> {
    CURRENT.with(|cell| cell.borrow().as_ref().map(|c| c.task))
}

/// Returns the timer driver of the current runtime, if a task is being polled
/// and its runtime runs one.
pub(crate) fn current_timer() -> Option<TimerHandle> {
    CURRENT.with(|cell| {
        cell.borrow()
            .as_ref()
            .and_then(|c| c.spawner.timer().cloned())
    })
}
