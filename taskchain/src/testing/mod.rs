//! Test support: side-effect recorders and concurrency probes.
//!
//! These fixtures back the queue's observable properties in tests:
//! ordering is asserted through an [`EffectLog`], the no-overlap guarantee
//! through an [`OverlapGuard`].

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A shared, ordered recorder of side effects.
///
/// Cheap to clone; all clones append to the same log. Tasks push a value
/// when they run, tests snapshot the log after a drain.
pub struct EffectLog<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for EffectLog<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> Default for EffectLog<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> EffectLog<T> {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value.
    pub fn push(&self, value: T) {
        self.entries.lock().push(value);
    }

    /// Returns a copy of everything recorded so far, in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.lock().clone()
    }

    /// Returns the number of recorded values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Tracks how many execution windows are open at once.
///
/// Each [`enter`](Self::enter) opens a window that closes when the returned
/// entry is dropped; [`peak`](Self::peak) reports the maximum number of
/// windows that were ever open simultaneously. A serialized executor keeps
/// the peak at one.
#[derive(Default)]
pub struct OverlapGuard {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// An open execution window; closes on drop.
pub struct OverlapEntry {
    active: Arc<AtomicUsize>,
}

impl OverlapGuard {
    /// Creates a new guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an execution window.
    #[must_use]
    pub fn enter(&self) -> OverlapEntry {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        OverlapEntry {
            active: self.active.clone(),
        }
    }

    /// Returns the number of currently open windows.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Returns the maximum number of windows ever open at once.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Drop for OverlapEntry {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Initializes tracing output for tests.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
