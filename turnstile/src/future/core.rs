use super::resolver::Resolver;
use super::settlement::{Resolution, Settlement};
use crate::scheduler::{Scheduler, WeakScheduler};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies a future in traces and loop errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FutureId(u64);

impl FutureId {
    fn next() -> Self {
        FutureId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FutureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observable state of a future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FutureState<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> FutureState<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FutureState::Pending)
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, FutureState::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, FutureState::Rejected(_))
    }

    pub fn into_settlement(self) -> Option<Settlement<T, E>> {
        match self {
            FutureState::Pending => None,
            FutureState::Fulfilled(value) => Some(Settlement::Fulfilled(value)),
            FutureState::Rejected(error) => Some(Settlement::Rejected(error)),
        }
    }
}

impl<T, E> From<Settlement<T, E>> for FutureState<T, E> {
    fn from(settlement: Settlement<T, E>) -> Self {
        match settlement {
            Settlement::Fulfilled(value) => FutureState::Fulfilled(value),
            Settlement::Rejected(error) => FutureState::Rejected(error),
        }
    }
}

/// A callback waiting for a future to settle.
pub(crate) type Reaction<T, E> = Box<dyn FnOnce(Settlement<T, E>)>;

struct FutureCell<T, E> {
    id: FutureId,
    scheduler: WeakScheduler,
    state: RefCell<FutureState<T, E>>,
    reactions: RefCell<Vec<Reaction<T, E>>>,
    /// Set by the first settlement attempt of any resolver.
    locked: Cell<bool>,
    /// Set once anything reacted to this future.
    handled: Cell<bool>,
}

/// A single-assignment container for an eventual value or error.
///
/// Cloning a `Future` yields another handle to the same container. The
/// future never runs user code by itself: its executor runs synchronously in
/// [`Future::new`], and every reaction runs later as a microtask of the
/// scheduler it was created on.
///
/// # Examples
///
/// ```rust,ignore
/// let doubled = scheduler
///     .create_future::<i32, String>(|resolver| resolver.resolve(21))
///     .map(|v| v * 2);
///
/// assert_eq!(scheduler.block_on(doubled)?, Settlement::Fulfilled(42));
/// ```
pub struct Future<T, E> {
    cell: Rc<FutureCell<T, E>>,
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    /// Creates a pending future and runs `executor` synchronously with its
    /// resolver.
    ///
    /// A panic in the executor is not turned into a rejection; it propagates
    /// to the callback that called `new`, where the loop catches it.
    pub fn new(scheduler: &Scheduler, executor: impl FnOnce(Resolver<T, E>)) -> Self {
        let (future, resolver) = Self::pending(scheduler);
        executor(resolver);
        future
    }

    /// Creates a pending future together with its resolver.
    pub fn pending(scheduler: &Scheduler) -> (Self, Resolver<T, E>) {
        Self::pending_in(scheduler.downgrade())
    }

    pub(crate) fn pending_in(scheduler: WeakScheduler) -> (Self, Resolver<T, E>) {
        let future = Self {
            cell: Rc::new(FutureCell {
                id: FutureId::next(),
                scheduler,
                state: RefCell::new(FutureState::Pending),
                reactions: RefCell::new(Vec::new()),
                locked: Cell::new(false),
                handled: Cell::new(false),
            }),
        };
        let resolver = Resolver::new(future.clone());

        (future, resolver)
    }

    /// A future already fulfilled with `value`.
    pub fn resolved(scheduler: &Scheduler, value: T) -> Self {
        Self::new(scheduler, |resolver| resolver.resolve(value))
    }

    /// A future already rejected with `error`.
    ///
    /// Like any rejection, it is reported as unhandled unless something
    /// reacts to it before the end of the current microtask drain.
    pub fn rejected(scheduler: &Scheduler, error: E) -> Self {
        Self::new(scheduler, |resolver| resolver.reject(error))
    }

    pub fn id(&self) -> FutureId {
        self.cell.id
    }

    pub fn state(&self) -> FutureState<T, E> {
        self.cell.state.borrow().clone()
    }

    /// The settlement, once there is one.
    pub fn settlement(&self) -> Option<Settlement<T, E>> {
        self.state().into_settlement()
    }

    pub fn is_pending(&self) -> bool {
        self.cell.state.borrow().is_pending()
    }

    pub fn is_settled(&self) -> bool {
        self.cell.state.borrow().is_settled()
    }

    /// Registers a pair of reactions and returns the future they settle.
    ///
    /// Exactly one of them runs, as a microtask, once `self` settles. What
    /// it returns settles the derived future; returning
    /// [`Resolution::Follow`] makes the derived future adopt another
    /// future's outcome.
    ///
    /// A reaction that panics is reported as a
    /// [`CallbackPanicked`](crate::LoopError::CallbackPanicked) microtask
    /// failure and leaves the derived future pending for good: reactions
    /// chained after it, including [`catch`](Self::catch), never run.
    pub fn register<U, E2>(
        &self,
        on_fulfilled: impl FnOnce(T) -> Resolution<U, E2> + 'static,
        on_rejected: impl FnOnce(E) -> Resolution<U, E2> + 'static,
    ) -> Future<U, E2>
    where
        U: Clone + 'static,
        E2: Clone + fmt::Debug + 'static,
    {
        let (derived, resolver) = Future::<U, E2>::pending_in(self.cell.scheduler.clone());

        self.subscribe(Box::new(move |settlement| {
            let resolution = match settlement {
                Settlement::Fulfilled(value) => on_fulfilled(value),
                Settlement::Rejected(error) => on_rejected(error),
            };
            resolver.settle(resolution);
        }));

        derived
    }

    /// Reacts to fulfillment; rejections pass through unchanged.
    pub fn then<U>(&self, on_fulfilled: impl FnOnce(T) -> Resolution<U, E> + 'static) -> Future<U, E>
    where
        U: Clone + 'static,
    {
        self.register(on_fulfilled, Resolution::Reject)
    }

    /// Transforms the fulfillment value.
    pub fn map<U>(&self, f: impl FnOnce(T) -> U + 'static) -> Future<U, E>
    where
        U: Clone + 'static,
    {
        self.register(move |value| Resolution::Fulfill(f(value)), Resolution::Reject)
    }

    /// Chains a computation that itself produces a future.
    pub fn and_then<U>(&self, f: impl FnOnce(T) -> Future<U, E> + 'static) -> Future<U, E>
    where
        U: Clone + 'static,
    {
        self.register(move |value| Resolution::Follow(f(value)), Resolution::Reject)
    }

    /// Reacts to rejection; fulfillment values pass through unchanged.
    pub fn catch<E2>(&self, on_rejected: impl FnOnce(E) -> Resolution<T, E2> + 'static) -> Future<T, E2>
    where
        E2: Clone + fmt::Debug + 'static,
    {
        self.register(Resolution::Fulfill, on_rejected)
    }

    /// Turns a rejection into a fulfillment value.
    pub fn recover(&self, f: impl FnOnce(E) -> T + 'static) -> Future<T, E> {
        self.register(Resolution::Fulfill, move |error| Resolution::Fulfill(f(error)))
    }

    /// Runs `f` on either outcome and forwards the original settlement.
    pub fn finally(&self, f: impl FnOnce() + 'static) -> Future<T, E> {
        let (derived, resolver) = Self::pending_in(self.cell.scheduler.clone());

        self.subscribe(Box::new(move |settlement| {
            f();
            resolver.settle(settlement.into());
        }));

        derived
    }

    /// Appends a raw reaction. Registration marks the future as handled.
    pub(crate) fn subscribe(&self, reaction: Reaction<T, E>) {
        self.mark_handled();

        let settled = self.settlement();
        match settled {
            None => self.cell.reactions.borrow_mut().push(reaction),
            Some(settlement) => match self.cell.scheduler.upgrade() {
                Some(scheduler) => scheduler.queue_microtask(move || reaction(settlement)),
                None => {
                    tracing::trace!(future = %self.cell.id, "scheduler gone, reaction dropped")
                }
            },
        }
    }

    /// Withdraws a pending unhandled-rejection report, if any.
    pub(crate) fn mark_handled(&self) {
        if self.cell.handled.replace(true) {
            return;
        }

        if self.cell.state.borrow().is_rejected() {
            if let Some(scheduler) = self.cell.scheduler.upgrade() {
                scheduler.untrack_rejection(self.cell.id);
            }
        }
    }

    /// Claims the right to settle. Returns `false` if it was already claimed.
    pub(crate) fn lock(&self) -> bool {
        !self.cell.locked.replace(true)
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.cell.locked.get()
    }

    pub(crate) fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Transitions out of `Pending` and schedules every registered reaction.
    ///
    /// Returns `false` if the future had already settled.
    pub(crate) fn settle(&self, settlement: Settlement<T, E>) -> bool {
        {
            let mut state = self.cell.state.borrow_mut();
            if state.is_settled() {
                return false;
            }
            *state = settlement.clone().into();
        }

        let reactions = mem::take(&mut *self.cell.reactions.borrow_mut());

        let Some(scheduler) = self.cell.scheduler.upgrade() else {
            tracing::trace!(future = %self.cell.id, "settled after scheduler was dropped");
            return true;
        };

        tracing::trace!(
            future = %self.cell.id,
            outcome = settlement.label(),
            reactions = reactions.len(),
            "future settled"
        );

        if let Settlement::Rejected(error) = &settlement {
            if !self.cell.handled.get() {
                scheduler.track_rejection(self.cell.id, format!("{error:?}"));
            }
        }

        for reaction in reactions {
            let settlement = settlement.clone();
            scheduler.queue_microtask(move || reaction(settlement));
        }

        true
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.cell.state.borrow() {
            FutureState::Pending => "pending",
            FutureState::Fulfilled(_) => "fulfilled",
            FutureState::Rejected(_) => "rejected",
        };

        f.debug_struct("Future")
            .field("id", &self.cell.id)
            .field("state", &state)
            .finish()
    }
}
