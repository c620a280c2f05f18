use super::core::Future;
use super::settlement::{Resolution, Settlement};
use crate::error::SettlementError;

use std::fmt;

/// The settlement capability of a pending future.
///
/// A resolver is handed to the executor of [`Future::new`] (or returned by
/// [`Future::pending`]). It can be cloned freely, but only the first
/// settlement attempt across all clones has any effect; later attempts are
/// silently ignored by [`resolve`](Self::resolve)/[`reject`](Self::reject)
/// and reported as [`SettlementError`] by the `try_` variants.
///
/// Following another future counts as the first attempt even though the
/// target stays pending until the followed future settles.
pub struct Resolver<T, E> {
    target: Future<T, E>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    pub(crate) fn new(target: Future<T, E>) -> Self {
        Self { target }
    }

    /// The future this resolver settles.
    pub fn future(&self) -> Future<T, E> {
        self.target.clone()
    }

    /// Returns `true` once a settlement attempt has been made.
    pub fn is_resolved(&self) -> bool {
        self.target.is_locked()
    }

    pub fn resolve(&self, value: T) {
        self.settle(Resolution::Fulfill(value));
    }

    pub fn reject(&self, error: E) {
        self.settle(Resolution::Reject(error));
    }

    /// Makes the target adopt the eventual outcome of `source`.
    pub fn follow(&self, source: Future<T, E>) {
        self.settle(Resolution::Follow(source));
    }

    pub fn settle(&self, resolution: Resolution<T, E>) {
        let _ = self.try_settle(resolution);
    }

    pub fn try_resolve(&self, value: T) -> Result<(), SettlementError> {
        self.try_settle(Resolution::Fulfill(value))
    }

    pub fn try_reject(&self, error: E) -> Result<(), SettlementError> {
        self.try_settle(Resolution::Reject(error))
    }

    /// Settles the target, or reports that an earlier attempt won.
    pub fn try_settle(&self, resolution: Resolution<T, E>) -> Result<(), SettlementError> {
        if !self.target.lock() {
            tracing::trace!(future = %self.target.id(), "ignored re-settlement");
            return Err(SettlementError::AlreadyResolved(self.target.id()));
        }

        match resolution {
            Resolution::Fulfill(value) => {
                self.target.settle(Settlement::Fulfilled(value));
            }
            Resolution::Reject(error) => {
                self.target.settle(Settlement::Rejected(error));
            }
            Resolution::Follow(source) => self.adopt(source),
        }

        Ok(())
    }

    fn adopt(&self, source: Future<T, E>) {
        if source.same(&self.target) {
            tracing::warn!(future = %self.target.id(), "future resolved with itself; it will never settle");
            return;
        }

        let target = self.target.clone();
        source.subscribe(Box::new(move |settlement| {
            target.settle(settlement);
        }));
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("future", &self.target)
            .finish()
    }
}
