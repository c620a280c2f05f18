use crate::error::TimeoutError;
use crate::future::{Future, Resolution, combinators::race};
use crate::scheduler::Scheduler;

use std::fmt;
use std::time::Duration;

/// Bounds the time `future` may take to settle.
///
/// The computation is raced against a timer macrotask. The returned future:
/// - fulfills with the computation's value if it fulfills first,
/// - rejects with [`TimeoutError::Inner`] if it rejects first,
/// - rejects with [`TimeoutError::Elapsed`] if the timer fires first.
///
/// The timer is cancelled as soon as the computation settles. The
/// computation itself is never aborted; a late outcome is ignored.
pub fn timeout<T, E>(
    scheduler: &Scheduler,
    future: Future<T, E>,
    duration: Duration,
) -> Future<T, TimeoutError<E>>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let (timer, expire) = Future::<T, TimeoutError<E>>::pending(scheduler);
    let token = scheduler.schedule_macrotask(
        move || expire.reject(TimeoutError::Elapsed(duration)),
        duration,
    );

    let owner = scheduler.downgrade();
    let computation = future
        .catch(|error| Resolution::Reject(TimeoutError::Inner(error)))
        .finally(move || {
            if let Some(scheduler) = owner.upgrade() {
                scheduler.cancel(&token);
            }
        });

    race(scheduler, [computation, timer])
}
