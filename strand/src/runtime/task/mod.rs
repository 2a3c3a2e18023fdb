//! Asynchronous task primitives.
//!
//! This module defines the abstractions the executor uses to represent,
//! schedule and complete spawned computations.
//!
//! It includes:
//! - the task cell and its lifecycle states,
//! - the readiness signal (custom waker) bound to each task,
//! - join handles for awaiting task completion,
//! - task identifiers and the failure type delivered through join handles.
//!
//! Most users will interact with this module through [`spawn`] and
//! [`JoinHandle`]; the lower-level components are used internally by the
//! executor.

pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod waker;

mod core;
mod error;
mod id;

pub(crate) use self::core::{Runnable, Task};

pub use self::core::spawn;
pub use error::JoinError;
pub use handle::JoinHandle;
pub use id::{Id, id, try_id};
