//! Host integration points.
//!
//! The scheduler depends on exactly two host services:
//! - a monotonic clock ([`Clock`]) used to key and release macrotasks,
//! - a way to block the loop while idle and to wake it again
//!   ([`Park`] / [`Unpark`]).
//!
//! Default implementations cover wall-clock operation ([`SystemClock`],
//! [`ThreadParker`]) and deterministic virtual time ([`ManualClock`]).
//! On Linux, [`EventFdParker`] exposes the wake-up signal as a pollable file
//! descriptor so the loop can sit alongside a host's own readiness polling.

mod clock;
mod park;

#[cfg(target_os = "linux")]
mod eventfd;

pub use clock::{Clock, ManualClock, SystemClock};
pub use park::{Park, ThreadParker, Unpark};

#[cfg(target_os = "linux")]
pub use eventfd::EventFdParker;
