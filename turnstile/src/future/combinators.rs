//! Aggregation of several futures into one.
//!
//! Every combinator subscribes to its inputs in input order and never runs
//! user code itself. Results that are collected (`all`, `all_settled`, the
//! errors of `any`) keep input order regardless of settlement order.

use super::core::Future;
use super::settlement::Settlement;
use crate::error::AggregateError;
use crate::scheduler::Scheduler;

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

/// Input-ordered slots filled as inputs settle.
struct Collector<V> {
    slots: Vec<Option<V>>,
    remaining: usize,
}

impl<V> Collector<V> {
    fn new(len: usize) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            slots: (0..len).map(|_| None).collect(),
            remaining: len,
        }))
    }

    /// Stores `value` at `index`. Returns every value once the last slot is
    /// filled.
    fn fill(&mut self, index: usize, value: V) -> Option<Vec<V>> {
        if self.slots[index].replace(value).is_none() {
            self.remaining -= 1;
        }

        if self.remaining > 0 {
            return None;
        }

        Some(self.slots.drain(..).flatten().collect())
    }
}

/// Fulfills with every value in input order, or rejects with the first
/// rejection.
///
/// An empty input fulfills with an empty vector.
pub fn all<T, E>(
    scheduler: &Scheduler,
    futures: impl IntoIterator<Item = Future<T, E>>,
) -> Future<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let futures: Vec<_> = futures.into_iter().collect();
    let (output, resolver) = Future::<Vec<T>, E>::pending(scheduler);

    if futures.is_empty() {
        resolver.resolve(Vec::new());
        return output;
    }

    let collector = Collector::new(futures.len());

    for (index, future) in futures.into_iter().enumerate() {
        let collector = collector.clone();
        let resolver = resolver.clone();

        future.subscribe(Box::new(move |settlement| match settlement {
            Settlement::Fulfilled(value) => {
                let complete = collector.borrow_mut().fill(index, value);
                if let Some(values) = complete {
                    resolver.resolve(values);
                }
            }
            Settlement::Rejected(error) => resolver.reject(error),
        }));
    }

    output
}

/// Settles like whichever input settles first.
///
/// An empty input stays pending forever.
pub fn race<T, E>(
    scheduler: &Scheduler,
    futures: impl IntoIterator<Item = Future<T, E>>,
) -> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let (output, resolver) = Future::<T, E>::pending(scheduler);

    for future in futures {
        let resolver = resolver.clone();
        future.subscribe(Box::new(move |settlement| resolver.settle(settlement.into())));
    }

    output
}

/// Fulfills with the first fulfillment, or rejects with an
/// [`AggregateError`] holding every error in input order once all inputs
/// rejected.
///
/// An empty input rejects immediately with an empty aggregate.
pub fn any<T, E>(
    scheduler: &Scheduler,
    futures: impl IntoIterator<Item = Future<T, E>>,
) -> Future<T, AggregateError<E>>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let futures: Vec<_> = futures.into_iter().collect();
    let (output, resolver) = Future::<T, AggregateError<E>>::pending(scheduler);

    if futures.is_empty() {
        resolver.reject(AggregateError::new(Vec::new()));
        return output;
    }

    let collector = Collector::new(futures.len());

    for (index, future) in futures.into_iter().enumerate() {
        let collector = collector.clone();
        let resolver = resolver.clone();

        future.subscribe(Box::new(move |settlement| match settlement {
            Settlement::Fulfilled(value) => resolver.resolve(value),
            Settlement::Rejected(error) => {
                let complete = collector.borrow_mut().fill(index, error);
                if let Some(errors) = complete {
                    resolver.reject(AggregateError::new(errors));
                }
            }
        }));
    }

    output
}

/// Fulfills with every settlement in input order once all inputs settled.
/// Never rejects.
pub fn all_settled<T, E>(
    scheduler: &Scheduler,
    futures: impl IntoIterator<Item = Future<T, E>>,
) -> Future<Vec<Settlement<T, E>>, Infallible>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let futures: Vec<_> = futures.into_iter().collect();
    let (output, resolver) = Future::<Vec<Settlement<T, E>>, Infallible>::pending(scheduler);

    if futures.is_empty() {
        resolver.resolve(Vec::new());
        return output;
    }

    let collector = Collector::new(futures.len());

    for (index, future) in futures.into_iter().enumerate() {
        let collector = collector.clone();
        let resolver = resolver.clone();

        future.subscribe(Box::new(move |settlement| {
            let complete = collector.borrow_mut().fill(index, settlement);
            if let Some(settlements) = complete {
                resolver.resolve(settlements);
            }
        }));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::Collector;

    #[test]
    fn test_collector_keeps_input_order() {
        let collector = Collector::new(3);

        assert_eq!(collector.borrow_mut().fill(2, "c"), None);
        assert_eq!(collector.borrow_mut().fill(0, "a"), None);
        assert_eq!(
            collector.borrow_mut().fill(1, "b"),
            Some(vec!["a", "b", "c"]),
            "values should come back in slot order"
        );
    }
}
