//! Cancellation protocol for queued tasks.
//!
//! This module provides:
//! - `CancellationHandle` for requesting cancellation of a single task
//! - The shared cancel state read by the queue and the task's context

mod handle;

pub use handle::{CancelCallback, CancellationHandle};

pub(crate) use handle::CancelState;
