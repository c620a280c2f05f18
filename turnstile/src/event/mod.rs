//! Named-event dispatch.
//!
//! An [`EventEmitter`] maps event names to ordered listener lists. Emitting
//! dispatches synchronously over a snapshot of the list taken at call time:
//! listeners added while an emit is in flight do not run for it, and
//! listeners removed while it is in flight still do.
//!
//! Listener failures are isolated: every listener of the snapshot runs, and
//! the failures are returned together as an [`EmitError`](crate::error::EmitError)
//! afterwards.

mod emitter;
mod listener;

pub use emitter::{DEFAULT_MAX_LISTENERS, EventEmitter};
pub use listener::{HandlerOutput, ListenerId, Subscription};
