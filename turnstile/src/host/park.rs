use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Blocks the loop thread while there is nothing to run.
///
/// The loop calls [`park`](Park::park) with the time left until the earliest
/// scheduled macrotask, or with `None` when it is only waiting for work
/// submitted from other threads. Implementations may return early (spurious
/// wake-ups are tolerated); the loop re-checks its queues after every return.
pub trait Park {
    /// Blocks the current thread for at most `timeout`, or until unparked.
    fn park(&self, timeout: Option<Duration>);

    /// Returns a thread-safe handle able to interrupt [`park`](Park::park).
    fn unparker(&self) -> Arc<dyn Unpark>;
}

/// Thread-safe wake-up handle paired with a [`Park`] implementation.
pub trait Unpark: Send + Sync {
    /// Wakes the parked loop, or makes its next `park` return immediately.
    fn unpark(&self);
}

/// Default parker built on a mutex-protected flag and a condition variable.
///
/// An `unpark` issued while the loop is not parked is remembered, so the
/// following `park` returns immediately instead of missing the notification.
#[derive(Clone)]
pub struct ThreadParker {
    signal: Arc<Signal>,
}

struct Signal {
    /// Set by `unpark`, consumed by `park`.
    notified: Mutex<bool>,

    /// Wakes the parked thread.
    condvar: Condvar,
}

impl ThreadParker {
    pub fn new() -> Self {
        Self {
            signal: Arc::new(Signal {
                notified: Mutex::new(false),
                condvar: Condvar::new(),
            }),
        }
    }
}

impl Default for ThreadParker {
    fn default() -> Self {
        Self::new()
    }
}

impl Park for ThreadParker {
    fn park(&self, timeout: Option<Duration>) {
        let notified = self
            .signal
            .notified
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut notified = match timeout {
            Some(timeout) => {
                self.signal
                    .condvar
                    .wait_timeout_while(notified, timeout, |notified| !*notified)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .signal
                .condvar
                .wait_while(notified, |notified| !*notified)
                .unwrap_or_else(PoisonError::into_inner),
        };

        *notified = false;
    }

    fn unparker(&self) -> Arc<dyn Unpark> {
        self.signal.clone()
    }
}

impl Unpark for Signal {
    fn unpark(&self) {
        *self.notified.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.condvar.notify_one();
    }
}
