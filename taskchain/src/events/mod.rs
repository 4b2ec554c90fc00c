//! Lifecycle events and event sinks.
//!
//! Every observable transition of a queued task is reported through an
//! [`EventSink`]: submission, start, settlement (completed, failed,
//! cancelled, or skipped), and queue drain. Sinks are used for
//! observability and for asserting lifecycle order in tests.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, QueueEvent};
