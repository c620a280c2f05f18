//! The scheduler loop.
//!
//! This module contains the single point of execution of the crate:
//! - [`Scheduler`], the loop handle owning both run queues,
//! - [`SchedulerBuilder`], the configuration entry point,
//! - [`Remote`], the only thread-safe way to feed the loop,
//! - the internal bookkeeping for loop state and unhandled rejections.
//!
//! Everything the loop runs executes on the thread that drives it, one
//! callback at a time, without preemption.

mod core;
mod rejection;
mod remote;
mod state;

pub(crate) mod builder;

pub use self::core::{Reporter, Scheduler};
pub(crate) use self::core::WeakScheduler;
pub use remote::Remote;
pub use state::LoopState;
