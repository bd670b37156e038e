//! Handles for tasks submitted to a [`TaskQueue`](crate::task_queue::TaskQueue).
//!
//! A task either returns a value or fails. Failures (panics inside the task)
//! are captured on the lane and delivered here as [`ErrorKind::TaskFailed`],
//! leaving the lane worker alive for the tasks queued behind it.
//!
//! [`ErrorKind::TaskFailed`]: ringdex_common::error::ErrorKind::TaskFailed

use std::time::Duration;

use ringdex_common::{Result, error::Error};

use crate::oneshot::OneshotReceiver;

/// The outcome a lane reports for a task: its value, or the failure message.
pub(crate) type TaskOutcome<R> = std::result::Result<R, String>;

/// A handle for waiting on the outcome of a task submitted with
/// [`TaskQueue::submit_async`](crate::task_queue::TaskQueue::submit_async).
///
/// Dropping the handle does not cancel the task; once accepted by a lane, a
/// task always runs to completion or failure.
pub struct TaskHandle<R>(OneshotReceiver<TaskOutcome<R>>);

impl<R> TaskHandle<R> {
    pub(crate) fn new(rx: OneshotReceiver<TaskOutcome<R>>) -> TaskHandle<R> {
        TaskHandle(rx)
    }

    /// Returns `true` if the task has finished, successfully or not.
    pub fn is_ready(&self) -> bool {
        !self.0.is_pending()
    }

    /// Waits for the task to finish and returns its result.
    ///
    /// # Errors
    ///
    /// Returns a `TaskFailed` error if the task panicked, or if it was
    /// discarded without running.
    pub fn join(self) -> Result<R> {
        Self::into_result(self.0.recv())
    }

    /// Waits for the task for at most `timeout`.
    ///
    /// Returns `None` if the task is still running when the timeout elapses,
    /// in which case the handle can be waited on again.
    pub fn join_timeout(&self, timeout: Duration) -> Option<Result<R>> {
        self.0.recv_timeout(timeout).ok().map(Self::into_result)
    }

    /// Waits for all handles, collecting their results in submission order.
    pub fn join_all(handles: impl IntoIterator<Item = TaskHandle<R>>) -> Vec<Result<R>> {
        handles.into_iter().map(|h| h.join()).collect()
    }

    fn into_result(outcome: Option<TaskOutcome<R>>) -> Result<R> {
        match outcome {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(Error::task_failed(message)),
            None => Err(Error::task_failed("task was discarded before it completed")),
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
