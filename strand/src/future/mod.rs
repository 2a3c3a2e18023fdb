//! Composition primitives.
//!
//! Every combinator here is itself a future: it owns its children, polls
//! them in place when it is polled, and never polls a child again after that
//! child completed.
//!
//! - [`join`] and [`join_all`] wait for all children,
//! - [`select`] waits for the first of two,
//! - [`chain`] sequences two stages, the second built from the first's
//!   output,
//! - [`fuse`] makes a future safe to poll after completion, and
//!   [`FusedFuture`] reports when it is done.

mod chain;
mod fuse;
mod join;
mod join_all;
mod maybe_done;
mod select;

pub use chain::{Chain, chain};
pub use fuse::{Fuse, FusedFuture, fuse};
pub use join::{Join, join};
pub use join_all::{JoinAll, join_all};
pub use select::{Either, Select, select};

pub use std::future::poll_fn;
