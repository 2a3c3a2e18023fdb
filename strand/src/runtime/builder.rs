use super::Runtime;
use super::executor::{DEFAULT_NAME, Executor, Spawner};
use super::queue::ready_queue;
use crate::time::driver;

use anyhow::Context;
use tracing::debug;

/// Default name of the timer driver thread.
const DEFAULT_TIMER_THREAD_NAME: &str = "strand-timer";

/// Builder for configuring and creating a runtime.
///
/// `Builder` allows customizing runtime parameters before constructing the
/// runtime: its name (recorded on the executor's tracing span) and whether a
/// background timer driver backs [`sleep`](crate::time::sleep).
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = Builder::new()
///     .name("ingest")
///     .enable_timer(false)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    /// Runtime name, used in logs.
    name: String,

    /// Whether to start the timer driver thread.
    enable_timer: bool,

    /// Name given to the timer driver thread.
    timer_thread_name: String,
}

impl Builder {
    /// Creates a new `Builder` with default configuration.
    ///
    /// By default the runtime is named `"strand"` and runs a timer driver on
    /// a thread named `"strand-timer"`.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            enable_timer: true,
            timer_thread_name: DEFAULT_TIMER_THREAD_NAME.to_owned(),
        }
    }

    /// Sets the runtime name recorded on the executor's tracing span.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables or disables the background timer driver.
    ///
    /// Without it, every [`sleep`](crate::time::sleep) is served by its own
    /// short-lived sleeper thread.
    pub fn enable_timer(mut self, enable: bool) -> Self {
        self.enable_timer = enable;
        self
    }

    /// Sets the name of the timer driver thread.
    pub fn timer_thread_name(mut self, name: impl Into<String>) -> Self {
        self.timer_thread_name = name.into();
        self
    }

    /// Builds the runtime with the configured options.
    ///
    /// Fails if the timer driver thread cannot be spawned.
    pub fn try_build(self) -> anyhow::Result<Runtime> {
        let (timer, driver) = if self.enable_timer {
            let (handle, thread) = driver::start(&self.timer_thread_name).with_context(|| {
                format!("failed to spawn timer thread `{}`", self.timer_thread_name)
            })?;
            (Some(handle), Some(thread))
        } else {
            (None, None)
        };

        let (queue, ready) = ready_queue();
        let executor = Executor::new(ready, self.name.as_str().into());
        let spawner = Spawner::new(queue, timer);

        debug!(name = %self.name, timer = self.enable_timer, "runtime built");

        Ok(Runtime::new(executor, spawner, driver))
    }

    /// Builds the runtime with the configured options.
    ///
    /// # Panics
    ///
    /// Panics if the runtime cannot be built; see [`try_build`](Self::try_build).
    pub fn build(self) -> Runtime {
        match self.try_build() {
            Ok(runtime) => runtime,
            Err(err) => panic!("failed to build strand runtime: {err:#}"),
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
