//! The queue's single consumer task.

use super::{QueueShared, QueuedTask};
use crate::context::TaskContext;
use crate::errors::TaskError;
use crate::events::QueueEvent;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Receives tasks in submission order and runs each to settlement before
/// taking the next. Exits when every queue handle has been dropped and the
/// channel has been emptied.
pub(super) async fn run(mut rx: mpsc::UnboundedReceiver<QueuedTask>, shared: QueueShared) {
    while let Some(task) = rx.recv().await {
        step(task, &shared).await;
    }
    debug!(queue = %shared.name, "Queue worker stopped");
}

/// Runs one chain step.
///
/// The cancellation check happens here, at execution time, not at
/// submission time. A task cancelled before this point is skipped without
/// its operation ever running; a task cancelled after its operation begins
/// keeps running until it observes the flag itself.
async fn step(task: QueuedTask, shared: &QueueShared) {
    let QueuedTask { id, state, op } = task;
    let queue = shared.name.to_string();

    if state.aborted() {
        debug!(queue = %shared.name, task_id = %id, "Skipping cancelled task");
        shared.sink.try_emit(QueueEvent::TaskSkipped { queue, task_id: id });
        state.mark_finished();
        shared.pending.fetch_sub(1, Ordering::SeqCst);
        return;
    }

    shared.sink.try_emit(QueueEvent::TaskStarted {
        queue: queue.clone(),
        task_id: id,
    });

    let ctx = TaskContext::new(id, state.clone());
    let started = Instant::now();

    // A failure or panic inside one task must not break the chain for the
    // tasks behind it.
    let outcome = AssertUnwindSafe(op(ctx)).catch_unwind().await;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    match outcome {
        Ok(Ok(())) => {
            debug!(queue = %shared.name, task_id = %id, duration_ms, "Task completed");
            shared.sink.try_emit(QueueEvent::TaskCompleted {
                queue,
                task_id: id,
                duration_ms,
            });
        }
        Ok(Err(TaskError::Cancelled)) => {
            debug!(queue = %shared.name, task_id = %id, duration_ms, "Task exited on cancellation");
            shared.sink.try_emit(QueueEvent::TaskCancelled {
                queue,
                task_id: id,
                duration_ms,
            });
        }
        Ok(Err(error)) => {
            warn!(queue = %shared.name, task_id = %id, error = %error, "Task failed");
            shared.sink.try_emit(QueueEvent::TaskFailed {
                queue,
                task_id: id,
                error: error.to_string(),
                duration_ms,
            });
        }
        Err(panic) => {
            let error = panic_message(panic.as_ref());
            warn!(queue = %shared.name, task_id = %id, error = %error, "Task panicked");
            shared.sink.try_emit(QueueEvent::TaskFailed {
                queue,
                task_id: id,
                error,
                duration_ms,
            });
        }
    }

    state.mark_finished();
    shared.pending.fetch_sub(1, Ordering::SeqCst);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
