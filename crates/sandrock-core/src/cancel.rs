use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

/// Cancellation flag shared between the caller and translation workers.
///
/// Clones observe the same flag. Waits on the token (retry delays) return
/// as soon as it is cancelled.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the run, waking all waiting workers.
    pub fn cancel(&self) {
        // Held so a waiter between its flag check and parking can't miss the wakeup
        let _guard = self.inner.mutex.lock();
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait for `duration` or until cancelled.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }

        let Ok(guard) = self.inner.mutex.lock() else {
            return true;
        };
        match self
            .inner
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_cancelled())
        {
            Ok((_, timeout)) => !timeout.timed_out(),
            // Poisoned mutex, treat as cancelled
            Err(_) => true,
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
