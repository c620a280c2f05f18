use crate::error::BoxError;
use crate::utils::panic_message;

use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Weak;

/// Identifies one registration on an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Values a listener may return.
///
/// `()` always succeeds. `Result<(), E>` reports its error as a
/// [`HandlerFailure`](crate::error::HandlerFailure) of the emit pass.
pub trait HandlerOutput {
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl HandlerOutput for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> HandlerOutput for Result<(), E> {
    fn into_outcome(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

pub(crate) type Handler<A> = Box<dyn Fn(&A) -> Result<(), BoxError>>;

pub(crate) struct Listener<A> {
    id: ListenerId,
    once: bool,
    fired: Cell<bool>,
    handler: Handler<A>,
}

impl<A> Listener<A> {
    pub(crate) fn new(id: ListenerId, once: bool, handler: Handler<A>) -> Self {
        Self {
            id,
            once,
            fired: Cell::new(false),
            handler,
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn is_once(&self) -> bool {
        self.once
    }

    /// Invokes the handler, turning a panic into a failure.
    ///
    /// A `once` listener answers `None` on every call after the first, which
    /// covers re-entrant emits holding an older snapshot.
    pub(crate) fn call(&self, args: &A) -> Option<Result<(), BoxError>> {
        if self.once && self.fired.replace(true) {
            return None;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.handler)(args)))
            .unwrap_or_else(|payload| Err(panic_message(&*payload).into()));

        Some(outcome)
    }
}

/// Removal half of an emitter, erased over the argument type.
pub(crate) trait Detach {
    fn detach(&self, event: &str, id: ListenerId) -> bool;
}

/// Disposer returned by [`EventEmitter::on`](crate::EventEmitter::on) and
/// friends.
///
/// Dropping a subscription does **not** remove the listener; call
/// [`dispose`](Self::dispose).
#[must_use = "dropping a Subscription keeps the listener registered"]
pub struct Subscription {
    emitter: Weak<dyn Detach>,
    event: String,
    id: ListenerId,
}

impl Subscription {
    pub(crate) fn new(emitter: Weak<dyn Detach>, event: String, id: ListenerId) -> Self {
        Self { emitter, event, id }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Removes the listener. Returns `false` if it was already gone (fired
    /// `once` listener, earlier `off`, or emitter dropped).
    pub fn dispose(self) -> bool {
        match self.emitter.upgrade() {
            Some(emitter) => emitter.detach(&self.event, self.id),
            None => false,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}
