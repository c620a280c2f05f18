//! Settle-once deferred computations.
//!
//! A [`Future`] starts out pending and settles exactly once, either
//! fulfilled with a value or rejected with an error. Reactions registered on
//! it never run synchronously: settlement (or registration on an already
//! settled future) schedules them as microtasks on the owning
//! [`Scheduler`](crate::Scheduler), in registration order.
//!
//! Chaining is typed: a reaction returns a [`Resolution`], which either
//! fulfills the derived future, rejects it, or makes it follow another
//! future. Rejections without a rejection handler pass through the chain
//! untouched.
//!
//! The [`combinators`] module builds `all`, `race`, `any` and `all_settled`
//! from these same reactions.

mod core;
mod resolver;
mod settlement;

pub mod combinators;

pub use self::core::{Future, FutureId, FutureState};
pub use resolver::Resolver;
pub use settlement::{Resolution, Settlement};
