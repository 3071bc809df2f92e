//! Re-render Requests
//!
//! An [`Updater`] is the bridge from a component's state mutation back to the
//! engine. Setting state never touches the engine directly (the engine may be
//! in the middle of a build, or borrowed by the caller); it only raises a flag.
//! The engine consumes the flag when it is idle, or right after the in-flight
//! commit finishes, and restarts reconciliation from the committed root.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

struct Inner {
    pending: AtomicBool,
    requests: AtomicU64,
    notify: Notify,
}

/// Cloneable handle that schedules a re-render of the owning engine.
#[derive(Clone)]
pub struct Updater {
    inner: Arc<Inner>,
}

impl Updater {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: AtomicBool::new(false),
                requests: AtomicU64::new(0),
                notify: Notify::new(),
            }),
        }
    }

    /// Request a re-render. Multiple requests before the engine gets to them
    /// collapse into one.
    pub fn schedule(&self) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        self.inner.pending.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    /// Whether a request is waiting to be picked up.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Total number of requests ever made through this handle.
    pub fn request_count(&self) -> u64 {
        self.inner.requests.load(Ordering::Relaxed)
    }

    /// Clear the pending flag, returning whether it was set.
    pub(crate) fn take(&self) -> bool {
        self.inner.pending.swap(false, Ordering::AcqRel)
    }

    /// Wait until the next request.
    pub(crate) async fn notified(&self) {
        self.inner.notify.notified().await;
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("pending", &self.is_pending())
            .field("requests", &self.request_count())
            .finish()
    }
}
