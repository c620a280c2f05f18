//! Error types reported by the scheduler, its futures and event emitters.
//!
//! Nothing in this module is ever thrown into unrelated user code: loop-level
//! failures are handed to the host through the scheduler's reporter (see
//! [`SchedulerBuilder::reporter`](crate::SchedulerBuilder::reporter)), while
//! per-operation failures are returned as values.

use crate::event::ListenerId;
use crate::future::FutureId;
use crate::queue::TaskId;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by event handlers.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Where a caught panic originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOrigin {
    /// A synchronous top-level unit of work passed to
    /// [`Scheduler::execute`](crate::Scheduler::execute).
    Script,

    /// A macrotask popped from the macrotask queue.
    Macrotask(TaskId),

    /// A microtask, including future reactions.
    Microtask,
}

impl fmt::Display for CallbackOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackOrigin::Script => f.write_str("script"),
            CallbackOrigin::Macrotask(id) => write!(f, "macrotask {id}"),
            CallbackOrigin::Microtask => f.write_str("microtask"),
        }
    }
}

/// Failures surfaced by the scheduler loop.
///
/// Variants that describe something going wrong *inside* a callback
/// (`UnhandledRejection`, `CallbackPanicked`, `Handler`) are delivered to the
/// host reporter and never interrupt the loop. The remaining variants are
/// returned from the driving methods themselves.
#[derive(Debug, Error)]
pub enum LoopError {
    /// A future was rejected and no reaction had been registered on it by the
    /// end of the microtask drain that followed.
    #[error("unhandled rejection of future {future}: {reason}")]
    UnhandledRejection { future: FutureId, reason: String },

    /// A callback panicked. The loop caught the panic and moved on.
    #[error("{origin} panicked: {message}")]
    CallbackPanicked {
        origin: CallbackOrigin,
        message: String,
    },

    /// One or more listeners failed during a scheduled emit.
    #[error(transparent)]
    Handler(#[from] EmitError),

    /// The loop was entered again while it was already running.
    #[error("the scheduler loop is already running")]
    AlreadyRunning,

    /// `block_on` ran out of work while its target was still pending.
    #[error("future {future} is still pending but the loop has no work left")]
    Stalled { future: FutureId },
}

/// Returned by the checked settlement methods of a [`Resolver`](crate::Resolver).
///
/// The unchecked `resolve`/`reject` ignore re-settlement silently; this error
/// only exists for callers that want to know their call lost the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("future {0} has already been resolved")]
    AlreadyResolved(FutureId),
}

/// Rejection reason produced by [`any`](crate::any) when every input rejected.
///
/// The constituent errors are kept in input order, not settlement order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("all {} futures were rejected", .errors.len())]
pub struct AggregateError<E> {
    pub errors: Vec<E>,
}

impl<E> AggregateError<E> {
    pub(crate) fn new(errors: Vec<E>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }
}

/// Rejection reason of a future wrapped with [`timeout`](crate::time::timeout).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutError<E> {
    /// The timer fired before the computation settled.
    #[error("deadline of {0:?} elapsed")]
    Elapsed(Duration),

    /// The computation rejected before the deadline.
    #[error("computation rejected: {0:?}")]
    Inner(E),
}

/// A single listener failure collected during an emit pass.
#[derive(Debug, Error)]
#[error("listener {listener} failed: {error}")]
pub struct HandlerFailure {
    pub listener: ListenerId,
    pub error: BoxError,
}

/// All listener failures of one [`emit`](crate::EventEmitter::emit) call.
///
/// Produced only after every listener of the snapshot was invoked.
#[derive(Debug, Error)]
#[error("{} listener(s) for event `{event}` failed", .failures.len())]
pub struct EmitError {
    pub event: String,
    pub failures: Vec<HandlerFailure>,
}

/// Returned by [`Remote`](crate::Remote) once the owning scheduler is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("the scheduler has been dropped")]
    Closed,
}
