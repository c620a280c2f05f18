//! Retry utilities for future-producing operations.
//!
//! The main entry point is [`retry`], which runs an operation produced by a
//! factory closure again each time its future rejects, until it fulfills or
//! the retry limit is reached.

mod retry;

#[doc(inline)]
pub use retry::{Retry, retry};
