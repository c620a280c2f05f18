use crate::future::{Future, Resolver, Settlement};
use crate::scheduler::{Scheduler, WeakScheduler};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Retries the operation produced by `factory` up to `times` extra times.
///
/// The factory runs once right away when [`Retry::run`] is called, then once
/// per retry. Without an interval, a retry starts from the reaction that
/// observed the rejection; with one, it starts from a macrotask scheduled
/// `interval` later.
///
/// # Examples
///
/// ```rust,ignore
/// let result = retry(&scheduler, 3, move || connect(&handle))
///     .set_interval(Duration::from_millis(100))
///     .run();
/// ```
pub fn retry<G>(scheduler: &Scheduler, times: usize, factory: G) -> Retry<G> {
    Retry::new(scheduler, times, factory)
}

/// Configured retry, started with [`run`](Self::run).
pub struct Retry<G> {
    scheduler: Scheduler,
    factory: G,
    times: usize,
    interval: Duration,
}

struct Attempts<G> {
    factory: G,
    remaining: usize,
}

impl<G> Retry<G> {
    fn new(scheduler: &Scheduler, times: usize, factory: G) -> Self {
        Self {
            scheduler: scheduler.clone(),
            factory,
            times,
            interval: Duration::ZERO,
        }
    }

    pub fn set_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts the first attempt and returns a future of the final outcome:
    /// the first fulfillment, or the last rejection.
    pub fn run<T, E>(self) -> Future<T, E>
    where
        G: FnMut() -> Future<T, E> + 'static,
        T: Clone + 'static,
        E: Clone + fmt::Debug + 'static,
    {
        let (output, resolver) = Future::<T, E>::pending(&self.scheduler);

        let attempts = Rc::new(RefCell::new(Attempts {
            factory: self.factory,
            remaining: self.times,
        }));

        attempt(self.scheduler.downgrade(), attempts, self.interval, resolver);

        output
    }
}

fn attempt<G, T, E>(
    scheduler: WeakScheduler,
    attempts: Rc<RefCell<Attempts<G>>>,
    interval: Duration,
    resolver: Resolver<T, E>,
) where
    G: FnMut() -> Future<T, E> + 'static,
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let future = (attempts.borrow_mut().factory)();

    future.subscribe(Box::new(move |settlement| {
        let error = match settlement {
            Settlement::Fulfilled(value) => return resolver.resolve(value),
            Settlement::Rejected(error) => error,
        };

        let remaining = {
            let mut attempts = attempts.borrow_mut();
            if attempts.remaining == 0 {
                None
            } else {
                attempts.remaining -= 1;
                Some(attempts.remaining)
            }
        };

        let Some(remaining) = remaining else {
            return resolver.reject(error);
        };

        tracing::debug!(remaining, ?error, "attempt rejected, retrying");

        if interval.is_zero() {
            return attempt(scheduler, attempts, interval, resolver);
        }

        if let Some(owner) = scheduler.upgrade() {
            owner.schedule_macrotask(
                move || attempt(scheduler, attempts, interval, resolver),
                interval,
            );
        }
    }));
}
