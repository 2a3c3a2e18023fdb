//! Core runtime components.
//!
//! This module contains the fundamental building blocks of the runtime:
//! the ready queue, the task cell, the scheduler loop and the handles used to
//! feed it.
//!
//! It is responsible for:
//! - turning spawned futures into pinned, reference-counted tasks,
//! - re-queueing tasks when their readiness signal fires,
//! - running queued tasks one progress attempt at a time,
//! - reporting results, panics and cancellations through join handles.
//!
//! Most users will interact with [`Builder`](builder::Builder),
//! [`Runtime`] and [`task::spawn`] rather than with the pieces directly.

mod core;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod executor;
pub(crate) mod queue;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
