use super::core::Future;

/// The terminal outcome of a future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<T, E> {
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> Settlement<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Settlement::Fulfilled(value) => Ok(value),
            Settlement::Rejected(error) => Err(error),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Settlement::Fulfilled(_) => "fulfilled",
            Settlement::Rejected(_) => "rejected",
        }
    }
}

impl<T, E> From<Result<T, E>> for Settlement<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Settlement::Fulfilled(value),
            Err(error) => Settlement::Rejected(error),
        }
    }
}

impl<T, E> From<Settlement<T, E>> for Result<T, E> {
    fn from(settlement: Settlement<T, E>) -> Self {
        settlement.into_result()
    }
}

/// What a reaction (or a resolver) settles a future with.
///
/// `Follow` makes the target adopt another future's eventual outcome, which
/// keeps chains flat: a reaction that produces a future never yields a
/// future of a future.
#[derive(Debug)]
pub enum Resolution<T, E> {
    Fulfill(T),
    Reject(E),
    Follow(Future<T, E>),
}

impl<T, E> From<Result<T, E>> for Resolution<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Resolution::Fulfill(value),
            Err(error) => Resolution::Reject(error),
        }
    }
}

impl<T, E> From<Settlement<T, E>> for Resolution<T, E> {
    fn from(settlement: Settlement<T, E>) -> Self {
        match settlement {
            Settlement::Fulfilled(value) => Resolution::Fulfill(value),
            Settlement::Rejected(error) => Resolution::Reject(error),
        }
    }
}

impl<T, E> From<Future<T, E>> for Resolution<T, E> {
    fn from(future: Future<T, E>) -> Self {
        Resolution::Follow(future)
    }
}
