use crate::future::Future;
use crate::scheduler::Scheduler;

use std::fmt;
use std::time::Duration;

/// Creates a future that fulfills once `duration` has elapsed.
///
/// The future is settled by a macrotask, so it never fulfills before the
/// current turn and its microtasks are done, even for a zero duration.
///
/// # Examples
///
/// ```rust,ignore
/// delay::<String>(&scheduler, Duration::from_millis(10))
///     .map(|()| println!("10ms later"));
/// ```
pub fn delay<E>(scheduler: &Scheduler, duration: Duration) -> Future<(), E>
where
    E: Clone + fmt::Debug + 'static,
{
    let (future, resolver) = Future::<(), E>::pending(scheduler);

    let token = scheduler.schedule_macrotask(move || resolver.resolve(()), duration);
    tracing::trace!(future = %future.id(), timer = %token.id(), ?duration, "delay armed");

    future
}
