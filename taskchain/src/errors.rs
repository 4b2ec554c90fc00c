//! Error types for the taskchain library.

use thiserror::Error;

/// Result alias for queued operations.
pub type TaskResult = Result<(), TaskError>;

/// An error reported by a queued operation.
///
/// Failures are contained to the task that produced them: the queue logs
/// the error, reports it through the event sink, and continues with the
/// next task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The operation reported a failure.
    #[error("Task failed: {0}")]
    Failed(String),

    /// The operation observed cancellation and exited cooperatively.
    #[error("Task cancelled")]
    Cancelled,

    /// IO error from within an operation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskError {
    /// Creates a failure error with a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Returns true if this error is a cooperative cancellation exit.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// An error from a queue-level operation.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue's worker task is gone and submitted work cannot settle.
    ///
    /// Only observable from [`drain`](crate::queue::SequentialTaskQueue::drain)
    /// while the runtime is shutting down.
    #[error("Queue is closed")]
    Closed,
}
