//! Time utilities and external event sources.
//!
//! This module provides readiness sources that live outside the executor:
//! - [`event`], a one-shot [`Event`] fired through its [`Trigger`] from any
//!   thread,
//! - [`sleep`] and [`sleep_until`], events fired by the runtime's timer
//!   driver,
//! - [`timeout`] for bounding future execution time.

pub(crate) mod driver;

mod event;
mod sleep;
mod timeout;

#[doc(inline)]
pub use event::{Event, Trigger, event};

#[doc(inline)]
pub use sleep::{Sleep, sleep, sleep_until};

#[doc(inline)]
pub use timeout::{Elapsed, Timeout, timeout};
