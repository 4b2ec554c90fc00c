//! The sequential task queue: submission, ordering, and drain.
//!
//! This module provides:
//! - `SequentialTaskQueue`, the single-consumer executor
//! - `QueueBuilder` for configuration
//! - The queued-task representation consumed by the worker

mod worker;


use crate::cancellation::{CancelState, CancellationHandle};
use crate::context::TaskContext;
use crate::errors::{QueueError, TaskError};
use crate::events::{EventSink, NoOpEventSink, QueueEvent};
use crate::utils::{generate_task_id, iso_timestamp};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;
use uuid::Uuid;

/// The boxed future produced by a queued operation.
pub type TaskFuture = BoxFuture<'static, Result<(), TaskError>>;

type TaskFn = Box<dyn FnOnce(TaskContext) -> TaskFuture + Send + 'static>;

/// A unit of work queued for execution, immutable once enqueued.
pub(crate) struct QueuedTask {
    pub(crate) id: Uuid,
    pub(crate) state: Arc<CancelState>,
    pub(crate) op: TaskFn,
}

/// State shared between queue handles and the worker.
///
/// Deliberately does not hold the task sender: the worker exits by channel
/// closure once every queue handle has been dropped.
#[derive(Clone)]
pub(crate) struct QueueShared {
    pub(crate) name: Arc<str>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) pending: Arc<AtomicUsize>,
}

/// A single-consumer sequential task queue.
///
/// Operations submitted to the same queue instance run strictly one at a
/// time, in submission order. Each submission returns a
/// [`CancellationHandle`] that can cancel that specific task: before it
/// starts, the task is skipped entirely; once running, the task must observe
/// the flag through its [`TaskContext`] and exit on its own.
///
/// A failure or panic inside one task never prevents the next task from
/// running. Independent queue instances share nothing.
///
/// The queue is cheap to clone; all clones submit to the same chain.
/// Construction spawns the consumer on the current tokio runtime, so a
/// queue must be created from within a runtime context. Dropping the last
/// clone lets the consumer finish whatever is already queued and stop.
#[derive(Clone)]
pub struct SequentialTaskQueue {
    shared: QueueShared,
    tx: mpsc::UnboundedSender<QueuedTask>,
}

impl SequentialTaskQueue {
    /// Creates a queue with a generated name and no event sink.
    #[must_use]
    pub fn new() -> Self {
        QueueBuilder::new().build()
    }

    /// Returns a builder for configuring a queue.
    #[must_use]
    pub fn builder() -> QueueBuilder {
        QueueBuilder::new()
    }

    fn with_parts(name: String, sink: Arc<dyn EventSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = QueueShared {
            name: Arc::from(name),
            sink,
            pending: Arc::new(AtomicUsize::new(0)),
        };

        tokio::spawn(worker::run(rx, shared.clone()));

        Self { shared, tx }
    }

    /// Submits an operation and returns its cancellation handle.
    ///
    /// Returns synchronously and immediately; the operation is scheduled to
    /// run strictly after every previously submitted operation on this queue
    /// has settled. The ordering position is captured inside this call, so
    /// submissions stay correctly ordered even when made from within a
    /// running operation on the same queue.
    ///
    /// The operation receives a [`TaskContext`]; operations that ignore it
    /// simply cannot be interrupted mid-body.
    pub fn submit<F, Fut>(&self, operation: F) -> CancellationHandle
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let id = generate_task_id();
        let state = Arc::new(CancelState::new());
        let handle = CancellationHandle::new(id, state.clone());

        let task = QueuedTask {
            id,
            state,
            op: Box::new(move |ctx| Box::pin(operation(ctx))),
        };

        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        self.shared.sink.try_emit(QueueEvent::TaskSubmitted {
            queue: self.shared.name.to_string(),
            task_id: id,
            submitted_at: iso_timestamp(),
        });

        if let Err(mpsc::error::SendError(task)) = self.tx.send(task) {
            // Worker is gone; only possible while the runtime shuts down.
            task.state.mark_finished();
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            warn!(
                queue = %self.shared.name,
                task_id = %id,
                "Submitted to a closed queue; task will never run"
            );
        }

        handle
    }

    /// Waits until everything submitted before this call has settled.
    ///
    /// Work submitted after `drain` begins (including reentrant submissions
    /// from tasks that were still pending) is not waited for.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the worker is gone and the marker
    /// task can never settle.
    pub async fn drain(&self) -> Result<(), QueueError> {
        let (done_tx, done_rx) = oneshot::channel();

        let _marker = self.submit(move |_ctx| async move {
            let _ = done_tx.send(());
            Ok(())
        });

        done_rx.await.map_err(|_| QueueError::Closed)?;

        self.shared.sink.try_emit(QueueEvent::QueueDrained {
            queue: self.shared.name.to_string(),
        });

        Ok(())
    }

    /// Returns the number of submitted tasks that have not yet settled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Returns the queue name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl Default for SequentialTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SequentialTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialTaskQueue")
            .field("name", &self.name())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Builder for configuring a [`SequentialTaskQueue`].
pub struct QueueBuilder {
    name: Option<String>,
    sink: Option<Arc<dyn EventSink>>,
}

impl QueueBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            sink: None,
        }
    }

    /// Sets the queue name used in logs and events.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the event sink receiving lifecycle events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the queue, spawning its consumer on the current runtime.
    #[must_use]
    pub fn build(self) -> SequentialTaskQueue {
        let name = self.name.unwrap_or_else(default_queue_name);
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(NoOpEventSink) as Arc<dyn EventSink>);

        SequentialTaskQueue::with_parts(name, sink)
    }
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_queue_name() -> String {
    let id = generate_task_id().simple().to_string();
    format!("queue-{}", &id[..8])
}
