use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio::time::Instant;

/// Cooperative run flag. Written once by the controller, polled by workers at the top of
/// each cycle.
#[derive(Debug)]
pub struct RunFlag {
    running: AtomicBool,
    notify: Notify,
}

impl RunFlag {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            notify: Notify::new(),
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Pacing sleep until `deadline` that returns early once the flag is cleared.
    pub async fn sleep_until(&self, deadline: Instant) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if !self.is_running() {
            return;
        }

        tokio::select! {
            () = tokio::time::sleep_until(deadline) => {}
            () = notified => {}
        }
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}
