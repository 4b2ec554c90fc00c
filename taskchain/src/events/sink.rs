//! Queue event type, sink trait, and sink implementations.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, Level};
use uuid::Uuid;

/// A lifecycle event emitted by a task queue.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    /// A task was submitted and enqueued.
    TaskSubmitted {
        /// Queue name.
        queue: String,
        /// Task identifier.
        task_id: Uuid,
        /// ISO 8601 submission time.
        submitted_at: String,
    },
    /// A task's operation began executing.
    TaskStarted {
        /// Queue name.
        queue: String,
        /// Task identifier.
        task_id: Uuid,
    },
    /// A task's operation completed successfully.
    TaskCompleted {
        /// Queue name.
        queue: String,
        /// Task identifier.
        task_id: Uuid,
        /// Execution time in milliseconds.
        duration_ms: f64,
    },
    /// A task's operation failed or panicked.
    TaskFailed {
        /// Queue name.
        queue: String,
        /// Task identifier.
        task_id: Uuid,
        /// Error description.
        error: String,
        /// Execution time in milliseconds.
        duration_ms: f64,
    },
    /// A task observed cancellation mid-execution and exited cooperatively.
    TaskCancelled {
        /// Queue name.
        queue: String,
        /// Task identifier.
        task_id: Uuid,
        /// Execution time in milliseconds.
        duration_ms: f64,
    },
    /// A task was cancelled before it started; its operation never ran.
    TaskSkipped {
        /// Queue name.
        queue: String,
        /// Task identifier.
        task_id: Uuid,
    },
    /// All work submitted before a drain request has settled.
    QueueDrained {
        /// Queue name.
        queue: String,
    },
}

impl QueueEvent {
    /// Returns the event kind as a short string (e.g., `"task.started"`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TaskSubmitted { .. } => "task.submitted",
            Self::TaskStarted { .. } => "task.started",
            Self::TaskCompleted { .. } => "task.completed",
            Self::TaskFailed { .. } => "task.failed",
            Self::TaskCancelled { .. } => "task.cancelled",
            Self::TaskSkipped { .. } => "task.skipped",
            Self::QueueDrained { .. } => "queue.drained",
        }
    }

    /// Returns the task identifier, if the event concerns a single task.
    #[must_use]
    pub fn task_id(&self) -> Option<Uuid> {
        match self {
            Self::TaskSubmitted { task_id, .. }
            | Self::TaskStarted { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::TaskFailed { task_id, .. }
            | Self::TaskCancelled { task_id, .. }
            | Self::TaskSkipped { task_id, .. } => Some(*task_id),
            Self::QueueDrained { .. } => None,
        }
    }
}

/// Trait for sinks that receive queue lifecycle events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: QueueEvent);

    /// Emits an event without blocking.
    ///
    /// This method must never fail; errors are suppressed.
    fn try_emit(&self, event: QueueEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: QueueEvent) {
        // Intentionally empty - discards all events
    }

    fn try_emit(&self, _event: QueueEvent) {
        // Intentionally empty - discards all events
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event: &QueueEvent) {
        match self.level {
            Level::DEBUG => {
                debug!(
                    event_kind = %event.kind(),
                    event = ?event,
                    "Queue event: {}", event.kind()
                );
            }
            _ => {
                info!(
                    event_kind = %event.kind(),
                    event = ?event,
                    "Queue event: {}", event.kind()
                );
            }
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: QueueEvent) {
        self.log_event(&event);
    }

    fn try_emit(&self, event: QueueEvent) {
        self.log_event(&event);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<QueueEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<QueueEvent> {
        self.events.read().clone()
    }

    /// Returns the kinds of all collected events, in emission order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.read().iter().map(QueueEvent::kind).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: QueueEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: QueueEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{generate_task_id, iso_timestamp};

    fn started_event() -> QueueEvent {
        QueueEvent::TaskStarted {
            queue: "test-queue".to_string(),
            task_id: generate_task_id(),
        }
    }

    #[test]
    fn test_event_kind() {
        let event = started_event();
        assert_eq!(event.kind(), "task.started");

        let drained = QueueEvent::QueueDrained {
            queue: "test-queue".to_string(),
        };
        assert_eq!(drained.kind(), "queue.drained");
        assert!(drained.task_id().is_none());
    }

    #[test]
    fn test_event_serializes() {
        let id = generate_task_id();
        let event = QueueEvent::TaskSubmitted {
            queue: "test-queue".to_string(),
            task_id: id,
            submitted_at: iso_timestamp(),
        };

        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(json["event"], "task_submitted");
        assert_eq!(json["queue"], "test-queue");
        assert_eq!(json["task_id"], id.to_string());
    }

    #[test]
    fn test_collecting_sink_records_in_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.try_emit(started_event());
        sink.try_emit(QueueEvent::QueueDrained {
            queue: "test-queue".to_string(),
        });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.kinds(), vec!["task.started", "queue.drained"]);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_collecting_sink_async_emit() {
        let sink = CollectingEventSink::new();
        sink.emit(started_event()).await;
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_noop_and_logging_sinks_do_not_panic() {
        NoOpEventSink.try_emit(started_event());
        LoggingEventSink::debug().try_emit(started_event());
        LoggingEventSink::info().try_emit(started_event());
    }
}
