//! Cooperative execution context passed into queued operations.

use crate::cancellation::CancelState;
use crate::errors::TaskError;
use std::sync::Arc;
use uuid::Uuid;

/// The execution context handed to a running operation.
///
/// Cancellation is advisory, not preemptive: an operation that never reads
/// [`aborted`](Self::aborted) and never yields runs to completion even after
/// cancellation has been requested. Long-running operations should check the
/// flag between chunks of work and call [`yield_now`](Self::yield_now) to
/// give the scheduler a turn.
pub struct TaskContext {
    task_id: Uuid,
    state: Arc<CancelState>,
}

impl TaskContext {
    pub(crate) fn new(task_id: Uuid, state: Arc<CancelState>) -> Self {
        Self { task_id, state }
    }

    /// Returns whether cancellation has been requested for this task.
    ///
    /// This is a live read of the handle's flag.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.state.aborted()
    }

    /// Returns the identifier of the running task.
    #[must_use]
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Returns `Err(TaskError::Cancelled)` if cancellation has been requested.
    ///
    /// Lets an operation exit with `?` at its checkpoints:
    ///
    /// ```rust,ignore
    /// ctx.ensure_active()?;
    /// ```
    pub fn ensure_active(&self) -> Result<(), TaskError> {
        if self.aborted() {
            Err(TaskError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Yields control back to the scheduler for one turn.
    ///
    /// Performs no work and introduces no delay. A cancel requested from
    /// another task gets a chance to be observed before the operation
    /// resumes at the point after the call.
    pub async fn yield_now(&self) {
        tokio::task::yield_now().await;
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("task_id", &self.task_id)
            .field("aborted", &self.aborted())
            .finish()
    }
}
