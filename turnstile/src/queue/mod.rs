//! The two run queues owned by the scheduler.
//!
//! - [`MicrotaskQueue`]: strict FIFO of high-priority callbacks (future
//!   reactions, `queue_microtask`), drained to exhaustion after every turn.
//! - [`MacrotaskQueue`]: callbacks keyed by the instant they become ready,
//!   released in non-decreasing `ready_at` order and FIFO among ties.
//!
//! Both queues are plain single-threaded data structures. The scheduler owns
//! them exclusively; cross-thread submissions go through
//! [`Remote`](crate::Remote) instead.

mod macrotask;
mod microtask;

pub use macrotask::{Macrotask, MacrotaskQueue, TaskId, TaskToken};
pub(crate) use macrotask::Slot;
pub use microtask::{Microtask, MicrotaskQueue};

/// A zero-argument callback stored in either queue.
pub(crate) type Callback = Box<dyn FnOnce()>;
