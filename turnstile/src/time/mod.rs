//! Timer-backed futures.
//!
//! Everything here is built from macrotasks scheduled on the scheduler the
//! caller passes in:
//! - [`delay`] fulfills after a duration,
//! - [`timeout`] races a computation against a timer,
//! - [`instrumented`] measures how long a future took to fulfill.

mod delay;
mod instrumented;
mod timeout;

#[doc(inline)]
pub use delay::delay;

#[doc(inline)]
pub use instrumented::instrumented;

#[doc(inline)]
pub use timeout::timeout;
