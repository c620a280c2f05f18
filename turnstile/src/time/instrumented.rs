use crate::future::Future;
use crate::scheduler::Scheduler;

use std::fmt;
use std::time::Duration;

/// Wraps a future and measures the time it takes to fulfill.
///
/// The returned future fulfills with a tuple containing:
/// - the value of the wrapped future,
/// - the time elapsed on the scheduler clock since `instrumented` was called.
///
/// Rejections pass through unchanged.
///
/// # Examples
///
/// ```rust,ignore
/// instrumented(&scheduler, fetch()).map(|(value, elapsed)| {
///     println!("completed in {elapsed:?}");
/// });
/// ```
pub fn instrumented<T, E>(scheduler: &Scheduler, future: Future<T, E>) -> Future<(T, Duration), E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let start = scheduler.now();
    let scheduler = scheduler.downgrade();

    future.map(move |value| {
        let elapsed = scheduler
            .upgrade()
            .map_or(Duration::ZERO, |scheduler| {
                scheduler.now().saturating_duration_since(start)
            });

        (value, elapsed)
    })
}
