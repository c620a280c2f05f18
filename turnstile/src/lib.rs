//! # Turnstile
//!
//! **Turnstile** is a single-threaded cooperative scheduler for Rust: an
//! explicit event loop with settle-once futures, a microtask queue, a
//! time-ordered macrotask queue and a snapshot-dispatching event emitter.
//!
//! Nothing in Turnstile is ambient. A [`Scheduler`] is created, handed to
//! every producer that needs it, and driven by the host; several loops can
//! live side by side on one thread.
//!
//! The loop follows one rule: every callback runs to completion, and every
//! microtask enqueued during a turn (including microtasks enqueued by other
//! microtasks) runs before the next macrotask starts.
//!
//! It offers:
//!
//! - **Futures** with first-settlement-wins semantics, typed chaining and
//!   unhandled-rejection reporting
//! - **Combinators** `all`, `race`, `any` and `all_settled`
//! - **Timers** including delays, timeouts and intervals
//! - An **event emitter** with `on`/`once`/`off` and isolated listener failures
//! - A thread-safe [`Remote`] handle for feeding the loop from other threads
//! - **Macros** `#[turnstile::main]` and `#[turnstile::test]`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use turnstile::{Scheduler, time::delay};
//! use std::time::Duration;
//!
//! #[turnstile::main]
//! fn main(scheduler: &Scheduler) {
//!     scheduler.schedule_macrotask(|| println!("A"), Duration::ZERO);
//!
//!     scheduler
//!         .create_future::<i32, String>(|resolver| resolver.resolve(1))
//!         .map(|_| println!("R"));
//!
//!     delay::<String>(scheduler, Duration::from_millis(100)).map(|()| println!("later"));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`future`]: Futures, resolvers and combinators
//! - [`event`]: The event emitter
//! - [`time`]: Delays, timeouts and instrumentation
//! - [`tools`]: Utilities like retry mechanisms
//! - [`queue`]: The two run queues driven by the scheduler
//! - [`host`]: Clock and park/unpark primitives supplied by the host
//! - [`error`]: Loop, settlement and emitter errors

mod scheduler;
mod utils;

pub mod error;
pub mod event;
pub mod future;
pub mod host;
pub mod queue;
pub mod time;
pub mod tools;

pub use error::LoopError;
pub use event::{EventEmitter, Subscription};
pub use future::combinators::{all, all_settled, any, race};
pub use future::{Future, FutureState, Resolution, Resolver, Settlement};
pub use queue::TaskToken;
pub use scheduler::builder::SchedulerBuilder;
pub use scheduler::{LoopState, Remote, Reporter, Scheduler};

pub use turnstile_macros::*;
