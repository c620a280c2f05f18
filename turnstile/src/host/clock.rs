use super::park::{Park, ThreadParker, Unpark};

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic time source.
///
/// The scheduler reads the clock when a macrotask is enqueued (to compute its
/// `ready_at` key) and whenever it looks for ready macrotasks.
pub trait Clock {
    /// Returns the current instant. Must never go backwards.
    fn now(&self) -> Instant;
}

/// Wall-clock time backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A virtual clock that only moves when told to.
///
/// `ManualClock` doubles as a [`Park`] implementation: when the loop idles
/// waiting for a timer, parking with a timeout *advances* virtual time by that
/// amount instead of sleeping. Timers therefore fire instantly and in exact
/// deadline order, which makes timer-heavy code deterministic to test.
///
/// Parking without a timeout (nothing scheduled, but a
/// [`Remote`](crate::Remote) is still alive) falls back to a real
/// [`ThreadParker`] so cross-thread submissions can still wake the loop.
///
/// Handles are cheap to clone and share the same time.
///
/// # Examples
///
/// ```rust,ignore
/// let clock = ManualClock::new();
/// let scheduler = SchedulerBuilder::new()
///     .clock(clock.clone())
///     .park(clock.clone())
///     .build();
///
/// clock.advance(Duration::from_millis(5));
/// ```
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
    parker: ThreadParker,
}

impl ManualClock {
    /// Creates a virtual clock starting at the current wall-clock instant.
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
            parker: ThreadParker::new(),
        }
    }

    /// Moves virtual time forward by `by`.
    ///
    /// An advance past the largest representable instant leaves the clock
    /// where it is.
    pub fn advance(&self, by: Duration) {
        match self.now.get().checked_add(by) {
            Some(next) => self.now.set(next),
            None => tracing::warn!(?by, "virtual clock advance overflows, ignored"),
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

impl Park for ManualClock {
    fn park(&self, timeout: Option<Duration>) {
        match timeout {
            Some(timeout) => self.advance(timeout),
            None => self.parker.park(None),
        }
    }

    fn unparker(&self) -> Arc<dyn Unpark> {
        self.parker.unparker()
    }
}
