use super::Id;

use std::any::Any;

/// Task failed to produce its output.
///
/// A `JoinError` is what a [`JoinHandle`](crate::task::JoinHandle) resolves
/// to when the spawned future did not run to completion. Failures are local
/// to the task: the executor keeps running every other task.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// The future panicked while being polled.
    #[error("task {id} panicked: {message}")]
    Panic {
        /// Task that panicked.
        id: Id,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// The task was dropped before it produced its output.
    ///
    /// This happens when the executor is torn down with the task still
    /// pending, or when a pending task's last readiness signal was dropped
    /// without being invoked.
    #[error("task {id} was cancelled before completion")]
    Cancelled {
        /// Task that was cancelled.
        id: Id,
    },
}

impl JoinError {
    pub(crate) fn panic(id: Id, payload: Box<dyn Any + Send>) -> Self {
        JoinError::Panic {
            id,
            message: panic_message(payload.as_ref()),
        }
    }

    pub(crate) fn cancelled(id: Id) -> Self {
        JoinError::Cancelled { id }
    }

    /// Returns the ID of the task that failed.
    pub fn id(&self) -> Id {
        match self {
            JoinError::Panic { id, .. } | JoinError::Cancelled { id } => *id,
        }
    }

    /// Returns `true` if the task panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, JoinError::Panic { .. })
    }

    /// Returns `true` if the task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JoinError::Cancelled { .. })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
