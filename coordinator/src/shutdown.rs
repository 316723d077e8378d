//! Cooperative shutdown controller.
//!
//! `main.rs` combines this with OS signals; the health prober's timer loop
//! selects on [`ShutdownController::wait`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Notify;

/// Cooperative shutdown signal shared by the prober loop and the HTTP server.
///
/// A probe cycle that is already running is not interrupted; the signal only
/// prevents the next cycle from being scheduled.
#[derive(Clone, Debug, Default)]
pub struct ShutdownController {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownController {
    /// Returns true if shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Request shutdown and wake all waiters.
    pub fn request_shutdown(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        // Registered before the flag check so a concurrent request cannot be missed.
        let notified = self.inner.notify.notified();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }
}
