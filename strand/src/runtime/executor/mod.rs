//! Task executor implementation.
//!
//! This module contains the two ends of the scheduling core:
//! - [`core`]: the executor, sole consumer of the ready queue,
//! - [`spawner`]: the cloneable producer handle used to submit tasks.
//!
//! [`new_executor_and_spawner`] wires a bare pair together. Most users go
//! through [`Runtime`](crate::Runtime) instead, which also runs a timer
//! driver.

pub(crate) mod core;
pub(crate) mod spawner;

pub use self::core::Executor;
pub use spawner::Spawner;

use crate::runtime::queue::ready_queue;

/// Default executor name, used in logs.
pub(crate) const DEFAULT_NAME: &str = "strand";

/// Creates a connected executor and spawner, without a timer driver.
///
/// [`sleep`](crate::time::sleep) still works on such an executor: every sleep
/// then falls back to a dedicated sleeper thread.
///
/// ```rust,ignore
/// let (executor, spawner) = strand::new_executor_and_spawner();
///
/// spawner.spawn(async { println!("howdy!") });
///
/// // Drop the spawner so the executor knows it is finished.
/// drop(spawner);
/// executor.run();
/// ```
pub fn new_executor_and_spawner() -> (Executor, Spawner) {
    let (queue, ready) = ready_queue();

    (
        Executor::new(ready, DEFAULT_NAME.into()),
        Spawner::new(queue, None),
    )
}
