use super::rejection::RejectionTracker;
use super::remote::{Command, Inbox, Remote};
use super::state::{LoopState, RunningGuard};
use crate::error::{CallbackOrigin, LoopError};
use crate::event::EventEmitter;
use crate::future::{Future, FutureId, Resolver, Settlement};
use crate::host::{Clock, Park};
use crate::queue::{Callback, Macrotask, MacrotaskQueue, MicrotaskQueue, TaskToken};
use crate::utils::panic_message;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// Host sink for loop failures (unhandled rejections, caught panics,
/// listener failures of scheduled emits).
pub type Reporter = Box<dyn Fn(&LoopError)>;

/// State owned by one scheduler instance.
pub(crate) struct Shared {
    name: String,
    state: Cell<LoopState>,
    microtasks: RefCell<MicrotaskQueue>,
    macrotasks: RefCell<MacrotaskQueue>,
    rejections: RefCell<RejectionTracker>,
    clock: Box<dyn Clock>,
    park: Box<dyn Park>,
    reporter: Reporter,
    inbox: Inbox,
}

/// A single-threaded cooperative scheduler.
///
/// The scheduler owns a microtask queue and a macrotask queue and drives them
/// according to one rule: **every microtask enqueued during a turn, including
/// microtasks enqueued by other microtasks, runs before the next macrotask
/// starts.** Each callback runs to completion; nothing is ever preempted.
///
/// `Scheduler` is a cheap, clonable handle (`!Send`). There is no ambient
/// global loop: producers receive the scheduler they should use, so several
/// independent loops can coexist on one thread.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = Scheduler::new();
///
/// scheduler.schedule_macrotask(|| println!("A"), Duration::ZERO);
/// Future::<i32, String>::resolved(&scheduler, 1).map(|_| println!("R"));
/// scheduler.schedule_macrotask(|| println!("B"), Duration::ZERO);
///
/// scheduler.run()?; // R, A, B
/// ```
#[derive(Clone)]
pub struct Scheduler {
    shared: Rc<Shared>,
}

/// Non-owning scheduler handle held by futures and queued callbacks.
#[derive(Clone)]
pub(crate) struct WeakScheduler(Weak<Shared>);

impl WeakScheduler {
    pub(crate) fn upgrade(&self) -> Option<Scheduler> {
        self.0.upgrade().map(|shared| Scheduler { shared })
    }
}

impl Scheduler {
    pub(crate) fn from_parts(
        name: String,
        clock: Box<dyn Clock>,
        park: Box<dyn Park>,
        reporter: Reporter,
    ) -> Self {
        let inbox = Inbox::new(park.unparker());

        Self {
            shared: Rc::new(Shared {
                name,
                state: Cell::new(LoopState::Idle),
                microtasks: RefCell::new(MicrotaskQueue::new()),
                macrotasks: RefCell::new(MacrotaskQueue::new()),
                rejections: RefCell::new(RejectionTracker::default()),
                clock,
                park,
                reporter,
                inbox,
            }),
        }
    }

    /// Creates a scheduler with the default configuration: wall-clock time,
    /// a condition-variable parker and a `tracing` reporter.
    pub fn new() -> Self {
        super::builder::SchedulerBuilder::new().build()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> LoopState {
        self.shared.state.get()
    }

    /// Current time according to the host clock.
    pub fn now(&self) -> Instant {
        self.shared.clock.now()
    }

    pub fn pending_microtasks(&self) -> usize {
        self.shared.microtasks.borrow().len()
    }

    pub fn pending_macrotasks(&self) -> usize {
        self.shared.macrotasks.borrow().len()
    }

    pub(crate) fn downgrade(&self) -> WeakScheduler {
        WeakScheduler(Rc::downgrade(&self.shared))
    }

    /// Appends `callback` to the microtask queue.
    pub fn queue_microtask(&self, callback: impl FnOnce() + 'static) {
        self.shared.microtasks.borrow_mut().enqueue(callback);
        tracing::trace!("microtask enqueued");
    }

    /// Schedules `callback` to run as a macrotask once `delay` has elapsed.
    ///
    /// A zero delay means "next available turn": the callback still waits for
    /// the current turn and its microtasks to finish. Callbacks with the same
    /// ready time run in scheduling order.
    ///
    /// A delay too large to represent (such as [`Duration::MAX`]) schedules
    /// a callback that never runs and does not keep the loop alive.
    pub fn schedule_macrotask(
        &self,
        callback: impl FnOnce() + 'static,
        delay: Duration,
    ) -> TaskToken {
        let ready_at = self.deadline(delay);
        self.shared
            .macrotasks
            .borrow_mut()
            .enqueue_boxed(Box::new(callback), ready_at, false)
    }

    /// Ready time of a macrotask scheduled `delay` from now, or `None` when
    /// it overflows `Instant`.
    fn deadline(&self, delay: Duration) -> Option<Instant> {
        self.now().checked_add(delay)
    }

    /// Schedules `callback` to run every `period` until the returned token is
    /// cancelled. The next occurrence is armed after the previous one ran.
    ///
    /// An occurrence that panics stops the interval.
    pub fn schedule_interval(
        &self,
        callback: impl FnMut() + 'static,
        period: Duration,
    ) -> TaskToken {
        let token = self.shared.macrotasks.borrow_mut().reserve(true);
        self.arm_interval(token.slot(), period, Rc::new(RefCell::new(callback)));
        token
    }

    fn arm_interval(
        &self,
        slot: Rc<crate::queue::Slot>,
        period: Duration,
        callback: Rc<RefCell<dyn FnMut()>>,
    ) {
        let scheduler = self.downgrade();
        let next = slot.clone();

        let occurrence: Callback = Box::new(move || {
            (callback.borrow_mut())();

            if let Some(scheduler) = scheduler.upgrade() {
                scheduler.arm_interval(next, period, callback);
            }
        });

        let ready_at = self.deadline(period);
        self.shared
            .macrotasks
            .borrow_mut()
            .requeue(slot, occurrence, ready_at);
    }

    /// Removes a scheduled macrotask (or stops an interval).
    ///
    /// Returns `false` if the entry already ran or was already cancelled.
    pub fn cancel(&self, token: &TaskToken) -> bool {
        self.shared.macrotasks.borrow_mut().cancel(token)
    }

    /// Creates a future bound to this scheduler. See [`Future::new`].
    pub fn create_future<T, E>(&self, executor: impl FnOnce(Resolver<T, E>)) -> Future<T, E>
    where
        T: Clone + 'static,
        E: Clone + fmt::Debug + 'static,
    {
        Future::new(self, executor)
    }

    /// Creates an empty event emitter.
    pub fn create_emitter<A: 'static>(&self) -> EventEmitter<A> {
        EventEmitter::new()
    }

    /// Emits `event` on `emitter` from a macrotask after `delay`.
    ///
    /// Listener failures of that emit are delivered to the reporter as
    /// [`LoopError::Handler`].
    pub fn schedule_emit<A: 'static>(
        &self,
        emitter: &EventEmitter<A>,
        event: impl Into<String>,
        args: A,
        delay: Duration,
    ) -> TaskToken {
        let emitter = emitter.clone();
        let event = event.into();
        let scheduler = self.downgrade();

        self.schedule_macrotask(
            move || {
                if let Err(err) = emitter.emit(&event, &args) {
                    if let Some(scheduler) = scheduler.upgrade() {
                        scheduler.report(&LoopError::Handler(err));
                    }
                }
            },
            delay,
        )
    }

    /// Returns a thread-safe submission handle. See [`Remote`].
    pub fn remote(&self) -> Remote {
        self.shared.inbox.remote()
    }

    pub(crate) fn report(&self, error: &LoopError) {
        (self.shared.reporter)(error);
    }

    pub(crate) fn track_rejection(&self, future: FutureId, reason: String) {
        self.shared.rejections.borrow_mut().track(future, reason);
    }

    pub(crate) fn untrack_rejection(&self, future: FutureId) {
        self.shared.rejections.borrow_mut().untrack(future);
    }

    /// Runs `script` as a synchronous top-level turn, then drains the
    /// microtask queue.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::AlreadyRunning`] when called from inside the loop.
    pub fn execute(&self, script: impl FnOnce()) -> Result<(), LoopError> {
        let _running = self.enter()?;

        self.invoke(CallbackOrigin::Script, script);
        self.drain_microtasks();

        Ok(())
    }

    /// Drives the loop until both queues are empty, no macrotask is scheduled
    /// for later and no [`Remote`] handle is alive.
    ///
    /// While only future macrotasks remain, the loop parks until the earliest
    /// one becomes ready.
    pub fn run(&self) -> Result<(), LoopError> {
        let _running = self.enter()?;

        self.drain_microtasks();

        loop {
            if self.turn() {
                continue;
            }

            if !self.idle() {
                return Ok(());
            }
        }
    }

    /// Processes every macrotask that is ready *now*, without parking.
    ///
    /// Returns the number of macrotasks executed.
    pub fn run_until_stalled(&self) -> Result<usize, LoopError> {
        let _running = self.enter()?;

        self.drain_microtasks();

        let mut executed = 0;
        while self.turn() {
            executed += 1;
        }

        Ok(executed)
    }

    /// Drains pending microtasks, then runs at most one ready macrotask (and
    /// the microtasks it produces).
    ///
    /// Returns `true` if a macrotask ran.
    pub fn tick(&self) -> Result<bool, LoopError> {
        let _running = self.enter()?;

        self.drain_microtasks();

        Ok(self.turn())
    }

    /// Drives the loop until `future` settles and returns its settlement.
    ///
    /// The future counts as handled: its rejection is returned here rather
    /// than reported as unhandled.
    ///
    /// # Errors
    ///
    /// - [`LoopError::AlreadyRunning`] when called from inside the loop.
    /// - [`LoopError::Stalled`] when the loop runs out of work first.
    pub fn block_on<T, E>(&self, future: Future<T, E>) -> Result<Settlement<T, E>, LoopError>
    where
        T: Clone + 'static,
        E: Clone + fmt::Debug + 'static,
    {
        let _running = self.enter()?;

        future.mark_handled();
        self.drain_microtasks();

        loop {
            if let Some(settlement) = future.settlement() {
                return Ok(settlement);
            }

            if self.turn() {
                continue;
            }

            if !self.idle() {
                return future
                    .settlement()
                    .ok_or(LoopError::Stalled { future: future.id() });
            }
        }
    }

    fn enter(&self) -> Result<RunningGuard<'_>, LoopError> {
        if self.shared.state.get() == LoopState::Running {
            return Err(LoopError::AlreadyRunning);
        }

        Ok(RunningGuard::new(&self.shared.state, &self.shared.name))
    }

    /// Runs one callback to completion, catching and reporting a panic.
    fn invoke(&self, origin: CallbackOrigin, callback: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
            self.report(&LoopError::CallbackPanicked {
                origin,
                message: panic_message(&*payload),
            });
        }
    }

    /// Exhaustively drains the microtask queue, then reports rejections that
    /// are still unhandled.
    fn drain_microtasks(&self) {
        let executed = MicrotaskQueue::drain(&self.shared.microtasks, |task| {
            self.invoke(CallbackOrigin::Microtask, task.into_callback());
        });

        if executed > 0 {
            tracing::trace!(executed, "microtasks drained");
        }

        let unhandled = self.shared.rejections.borrow_mut().take();
        for (future, reason) in unhandled {
            self.report(&LoopError::UnhandledRejection { future, reason });
        }
    }

    /// Pops and runs one ready macrotask. Returns `false` if none was ready.
    fn turn(&self) -> bool {
        self.ingest_remote();

        let now = self.now();
        let next = self.shared.macrotasks.borrow_mut().pop_ready(now);

        match next {
            Some(task) => {
                self.run_macrotask(task);
                true
            }
            None => false,
        }
    }

    fn run_macrotask(&self, task: Macrotask) {
        let id = task.id();
        tracing::trace!(task = %id, "macrotask started");

        let (callback, completion) = task.into_parts();
        self.invoke(CallbackOrigin::Macrotask(id), callback);
        completion.complete();

        self.drain_microtasks();
    }

    /// Moves remote submissions into the macrotask queue.
    fn ingest_remote(&self) -> usize {
        let now = self.now();
        let mut ingested = 0;

        for command in self.shared.inbox.try_iter() {
            match command {
                Command::Schedule { callback, delay } => {
                    self.shared
                        .macrotasks
                        .borrow_mut()
                        .enqueue_boxed(callback, now.checked_add(delay), false);
                    ingested += 1;
                }
            }
        }

        if ingested > 0 {
            tracing::debug!(ingested, "remote macrotasks ingested");
        }

        ingested
    }

    /// Waits for the next macrotask to become ready.
    ///
    /// Returns `false` when there is nothing left to wait for and the loop
    /// should terminate.
    fn idle(&self) -> bool {
        let deadline = self.shared.macrotasks.borrow_mut().next_deadline();

        match deadline {
            Some(ready_at) => {
                let now = self.now();
                if ready_at > now {
                    tracing::trace!(wait = ?(ready_at - now), "parking until next macrotask");
                    self.shared.park.park(Some(ready_at - now));
                }
                true
            }
            None if self.shared.inbox.has_remotes() => {
                tracing::trace!("parking until remote submission");
                self.shared.park.park(None);
                true
            }
            // The last remote may have submitted right before being dropped.
            None => self.ingest_remote() > 0,
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.shared.name)
            .field("state", &self.shared.state.get())
            .field("microtasks", &self.pending_microtasks())
            .field("macrotasks", &self.pending_macrotasks())
            .finish()
    }
}
