//! Cancellation handle returned by task submission.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn Fn() + Send + Sync>;

/// Shared cancellation state for a single queued task.
///
/// Held by the handle (writer side) and by the queue's execution of the
/// task (reader side).
#[derive(Default)]
pub(crate) struct CancelState {
    /// Whether cancellation has been requested.
    aborted: AtomicBool,
    /// Whether the task has settled (ran, failed, or was skipped).
    finished: AtomicBool,
    /// Callbacks to invoke on cancellation.
    callbacks: RwLock<Vec<CancelCallback>>,
}

impl CancelState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub(crate) fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Marks the task as settled. Later cancellation requests are no-ops.
    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub(crate) fn request_cancel(&self) {
        if self.finished() {
            // The task already settled; the handle is inert.
            return;
        }

        // Only the first request takes effect
        if self
            .aborted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let callbacks = self.callbacks.read();
            for callback in callbacks.iter() {
                if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    callback();
                })) {
                    warn!("Cancellation callback panicked: {:?}", e);
                }
            }
        }
    }

    fn register_callback(&self, callback: CancelCallback) {
        if self.aborted() {
            // Already cancelled, invoke immediately
            if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback();
            })) {
                warn!("Cancellation callback panicked: {:?}", e);
            }
        } else {
            self.callbacks.write().push(callback);
        }
    }
}

/// A handle for cancelling one submitted task.
///
/// Returned synchronously by [`submit`](crate::queue::SequentialTaskQueue::submit).
/// Cancellation is cooperative and idempotent: the first `cancel` call sets
/// the flag, later calls have no additional effect, and calls after the task
/// has settled are no-ops. `cancel` never fails and never blocks, and may be
/// called from any task or thread.
#[derive(Clone)]
pub struct CancellationHandle {
    task_id: Uuid,
    state: Arc<CancelState>,
}

impl CancellationHandle {
    pub(crate) fn new(task_id: Uuid, state: Arc<CancelState>) -> Self {
        Self { task_id, state }
    }

    /// Requests cancellation of the task.
    ///
    /// If the task has not started, it will be skipped entirely. If it is
    /// already running, it keeps running until it observes the flag through
    /// its [`TaskContext`](crate::context::TaskContext) and exits on its own.
    pub fn cancel(&self) {
        self.state.request_cancel();
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.state.aborted()
    }

    /// Returns whether the task has settled (completed, failed, or skipped).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.finished()
    }

    /// Returns the identifier of the task this handle controls.
    #[must_use]
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Registers a callback to be invoked when cancellation is requested.
    ///
    /// If cancellation was already requested, the callback is invoked
    /// immediately. Panics in callbacks are logged and suppressed.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.state.register_callback(Box::new(callback));
    }
}

impl std::fmt::Debug for CancellationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationHandle")
            .field("task_id", &self.task_id)
            .field("aborted", &self.aborted())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_task_id;
    use std::sync::atomic::AtomicUsize;

    fn handle() -> CancellationHandle {
        CancellationHandle::new(generate_task_id(), Arc::new(CancelState::new()))
    }

    #[test]
    fn test_handle_default_not_aborted() {
        let handle = handle();
        assert!(!handle.aborted());
        assert!(!handle.is_finished());
    }

    #[test]
    fn test_cancel_sets_flag() {
        let handle = handle();
        handle.cancel();
        assert!(handle.aborted());
    }

    #[test]
    fn test_cancel_idempotent() {
        let handle = handle();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        handle.on_cancel(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        handle.cancel();
        handle.cancel();
        handle.cancel();

        // Callbacks fired once, flag still set
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(handle.aborted());
    }

    #[test]
    fn test_cancel_after_finish_is_noop() {
        let handle = handle();
        handle.state.mark_finished();

        handle.cancel();

        assert!(!handle.aborted());
        assert!(handle.is_finished());
    }

    #[test]
    fn test_on_cancel_before_cancellation() {
        let handle = handle();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        handle.on_cancel(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(counter.load(Ordering::SeqCst), 0);

        handle.cancel();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_cancel_after_cancellation() {
        let handle = handle();
        handle.cancel();

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        // Should invoke immediately
        handle.on_cancel(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_panic_suppressed() {
        let handle = handle();

        handle.on_cancel(|| {
            panic!("Intentional panic");
        });

        // Should not panic
        handle.cancel();
        assert!(handle.aborted());
    }

    #[test]
    fn test_handles_share_state() {
        let handle = handle();
        let other = handle.clone();

        other.cancel();

        assert!(handle.aborted());
        assert_eq!(handle.task_id(), other.task_id());
    }
}
