use super::core::{Reporter, Scheduler};
use crate::error::LoopError;
use crate::host::{Clock, ManualClock, Park, SystemClock, ThreadParker};

/// Builder for configuring and creating a [`Scheduler`].
///
/// Every setting has a default, so `SchedulerBuilder::new().build()` yields a
/// wall-clock scheduler that logs loop failures through `tracing`.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new()
///     .name("ui")
///     .virtual_time()
///     .reporter(|error| eprintln!("loop error: {error}"))
///     .build();
/// ```
pub struct SchedulerBuilder {
    /// Name attached to the loop's tracing span.
    name: String,

    /// Host clock; `SystemClock` when unset.
    clock: Option<Box<dyn Clock>>,

    /// Idle wait primitive; `ThreadParker` when unset.
    park: Option<Box<dyn Park>>,

    /// Host error sink; logs through `tracing` when unset.
    reporter: Option<Reporter>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            name: String::from("turnstile"),
            clock: None,
            park: None,
            reporter: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the monotonic clock used to key macrotasks.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Sets the primitive used to block the loop while it waits for work.
    pub fn park(mut self, park: impl Park + 'static) -> Self {
        self.park = Some(Box::new(park));
        self
    }

    /// Runs the loop on a fresh [`ManualClock`]: idle waits advance virtual
    /// time instead of sleeping, so timers fire immediately and in order.
    pub fn virtual_time(self) -> Self {
        let clock = ManualClock::new();
        self.clock(clock.clone()).park(clock)
    }

    /// Sets the sink receiving loop failures.
    ///
    /// The reporter runs on the loop thread, between callbacks.
    pub fn reporter(mut self, reporter: impl Fn(&LoopError) + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    pub fn build(self) -> Scheduler {
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock));
        let park = self
            .park
            .unwrap_or_else(|| Box::new(ThreadParker::new()));
        let reporter = self
            .reporter
            .unwrap_or_else(|| default_reporter(self.name.clone()));

        Scheduler::from_parts(self.name, clock, park, reporter)
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_reporter(name: String) -> Reporter {
    Box::new(move |error| match error {
        LoopError::UnhandledRejection { .. } => {
            tracing::warn!(scheduler = %name, %error, "unhandled rejection");
        }
        _ => {
            tracing::error!(scheduler = %name, %error, "loop failure");
        }
    })
}
