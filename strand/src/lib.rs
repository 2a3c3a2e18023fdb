//! # Strand
//!
//! **Strand** is a small poll-based executor for Rust futures.
//!
//! A future handed to the runtime becomes a *task*: it is pinned on the heap
//! once and then driven by repeated progress attempts. A task that cannot
//! make progress stores its readiness signal (a [`Waker`](std::task::Waker))
//! with whatever it waits on and suspends; firing that signal puts the task
//! back on a FIFO ready queue, from which a single-threaded scheduler loop
//! takes it for its next attempt. The loop stops on its own once no spawner
//! and no readiness signal is left that could ever enqueue more work.
//!
//! Strand provides:
//!
//! - a **single-threaded scheduler** fed by a multi-producer ready queue
//! - **spawn and join handles**, with panics and cancellations reported as
//!   [`JoinError`](task::JoinError)s
//! - **composition primitives** like [`join`](future::join),
//!   [`chain`](future::chain) and [`select`](future::select)
//! - **external event sources**: one-shot [`event`](time::event)s, timers
//!   and timeouts
//! - a poll-based **byte stream contract** with an in-memory mock
//! - **ergonomic macros** like `#[strand::main]`, `#[strand::test]`, `join!`
//!   and `select!`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strand::time::sleep;
//! use std::time::Duration;
//!
//! #[strand::main]
//! async fn main() {
//!     // Spawn a background task
//!     let handle = strand::spawn(async {
//!         sleep(Duration::from_millis(100)).await;
//!         "task completed"
//!     });
//!
//!     // Wait for the task to finish
//!     println!("{}", handle.await.unwrap());
//! }
//! ```
//!
//! Driving the loop by hand:
//!
//! ```rust,ignore
//! let (executor, spawner) = strand::new_executor_and_spawner();
//!
//! spawner.spawn(async { println!("howdy!") });
//!
//! drop(spawner);
//! executor.run();
//! ```
//!
//! ## Modules
//!
//! - [`task`]: spawning, join handles and task identity
//! - [`future`]: composition primitives
//! - [`time`]: events, sleep and timeout
//! - [`io`]: poll-based byte streams

mod runtime;

pub mod future;
pub mod io;
pub mod time;

#[cfg(test)]
mod test_utils;

pub use runtime::Runtime;
pub use runtime::builder::Builder;
pub use runtime::executor::{Executor, Spawner, new_executor_and_spawner};
pub use runtime::task;
pub use runtime::task::spawn;
pub use runtime::yield_now::{YieldNow, yield_now};

pub use strand_macros::*;
