//! # Taskchain
//!
//! A single-consumer sequential task queue with cooperative cancellation.
//!
//! Taskchain runs submitted asynchronous operations strictly one at a time,
//! in submission order, with support for:
//!
//! - **FIFO execution**: each operation starts only after the previous one
//!   has fully settled (success, failure, panic, or skip)
//! - **Synchronous submission**: `submit` returns a cancellation handle
//!   immediately, without waiting for any prior work
//! - **Cancellation before start**: a cancelled task is skipped entirely
//! - **Cooperative mid-task cancellation**: running operations observe the
//!   flag through their context and exit voluntarily
//! - **Failure containment**: a failing or panicking task never blocks the
//!   tasks behind it
//! - **Event-driven observability**: lifecycle events through pluggable sinks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taskchain::prelude::*;
//!
//! let queue = SequentialTaskQueue::new();
//!
//! let handle = queue.submit(|ctx| async move {
//!     for chunk in 0..64 {
//!         ctx.ensure_active()?;
//!         process(chunk).await?;
//!         ctx.yield_now().await;
//!     }
//!     Ok(())
//! });
//!
//! // From anywhere, at any time:
//! handle.cancel();
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod context;
pub mod errors;
pub mod events;
pub mod queue;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationHandle;
    pub use crate::context::TaskContext;
    pub use crate::errors::{QueueError, TaskError, TaskResult};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, QueueEvent,
    };
    pub use crate::queue::{QueueBuilder, SequentialTaskQueue, TaskFuture};
    pub use crate::utils::{generate_task_id, iso_timestamp, Timestamp};
}
