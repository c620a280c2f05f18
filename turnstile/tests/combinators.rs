use turnstile::{Future, FutureState, LoopError, Scheduler, SchedulerBuilder, Settlement};
use turnstile::{all, all_settled, any, race};

use std::time::Duration;

fn scheduler() -> Scheduler {
    SchedulerBuilder::new().virtual_time().build()
}

/// A future settled by a macrotask `ms` milliseconds from now.
fn after(scheduler: &Scheduler, ms: u64, outcome: Result<i32, &'static str>) -> Future<i32, &'static str> {
    let (future, resolver) = Future::pending(scheduler);

    scheduler.schedule_macrotask(
        move || match outcome {
            Ok(value) => resolver.resolve(value),
            Err(error) => resolver.reject(error),
        },
        Duration::from_millis(ms),
    );

    future
}

#[test]
fn test_all_preserves_input_order() {
    let scheduler = scheduler();

    let first = after(&scheduler, 10, Ok(2));
    let second = after(&scheduler, 20, Ok(1));
    let joined = all(&scheduler, [first, second]);

    assert_eq!(
        scheduler.block_on(joined).expect("all should settle"),
        Settlement::Fulfilled(vec![2, 1]),
        "Values should follow input order"
    );

    let slow = after(&scheduler, 30, Ok(1));
    let fast = after(&scheduler, 5, Ok(2));
    let joined = all(&scheduler, [slow, fast]);

    assert_eq!(
        scheduler.block_on(joined).expect("all should settle"),
        Settlement::Fulfilled(vec![1, 2]),
        "Values should follow input order, not settlement order"
    );
}

#[test]
fn test_all_rejects_with_first_settled_rejection() {
    let scheduler = scheduler();

    let (never, _resolver) = Future::<i32, &'static str>::pending(&scheduler);
    let joined = all(
        &scheduler,
        [
            after(&scheduler, 30, Err("slow")),
            after(&scheduler, 10, Err("fast")),
            never,
        ],
    );

    assert_eq!(
        scheduler.block_on(joined).expect("all should settle"),
        Settlement::Rejected("fast"),
        "The earliest rejection by settlement order should win"
    );
}

#[test]
fn test_all_of_nothing_fulfills_empty() {
    let scheduler = scheduler();
    let joined = all::<i32, String>(&scheduler, Vec::new());

    assert_eq!(joined.state(), FutureState::Fulfilled(Vec::new()));
}

#[test]
fn test_race_prefers_already_settled_input() {
    let scheduler = scheduler();

    let timer = after(&scheduler, 100, Ok(1));
    let ready = Future::resolved(&scheduler, 7);
    let raced = race(&scheduler, [timer, ready]);

    assert_eq!(
        scheduler.block_on(raced).expect("race should settle"),
        Settlement::Fulfilled(7)
    );
}

#[test]
fn test_race_settles_with_first_rejection_too() {
    let scheduler = scheduler();

    let raced = race(
        &scheduler,
        [after(&scheduler, 20, Ok(1)), after(&scheduler, 10, Err("first"))],
    );

    assert_eq!(
        scheduler.block_on(raced).expect("race should settle"),
        Settlement::Rejected("first")
    );
}

#[test]
fn test_race_of_nothing_stays_pending() {
    let scheduler = scheduler();
    let raced = race::<i32, String>(&scheduler, Vec::new());

    assert!(
        matches!(scheduler.block_on(raced), Err(LoopError::Stalled { .. })),
        "An empty race should never settle"
    );
}

#[test]
fn test_any_aggregates_errors_in_input_order() {
    let scheduler = scheduler();

    let anyone = any(
        &scheduler,
        [after(&scheduler, 20, Err("a")), after(&scheduler, 10, Err("b"))],
    );

    match scheduler.block_on(anyone).expect("any should settle") {
        Settlement::Rejected(aggregate) => {
            assert_eq!(aggregate.errors, ["a", "b"], "Errors should follow input order");
        }
        other => panic!("expected an aggregate rejection, got {other:?}"),
    }
}

#[test]
fn test_any_fulfills_with_first_fulfillment() {
    let scheduler = scheduler();

    let anyone = any(
        &scheduler,
        [
            after(&scheduler, 5, Err("x")),
            after(&scheduler, 20, Ok(6)),
            after(&scheduler, 10, Ok(5)),
        ],
    );

    assert_eq!(
        scheduler.block_on(anyone).expect("any should settle"),
        Settlement::Fulfilled(5)
    );
}

#[test]
fn test_any_of_nothing_rejects_immediately() {
    let scheduler = scheduler();
    let anyone = any::<i32, String>(&scheduler, Vec::new());

    assert!(
        matches!(anyone.state(), FutureState::Rejected(ref aggregate) if aggregate.is_empty()),
        "An empty any should reject right away with an empty aggregate"
    );

    assert!(scheduler.block_on(anyone).is_ok());
}

#[test]
fn test_all_settled_never_rejects() {
    let scheduler = scheduler();

    let settled = all_settled(
        &scheduler,
        [
            Future::resolved(&scheduler, 1),
            Future::rejected(&scheduler, "x"),
            after(&scheduler, 10, Ok(3)),
        ],
    );

    assert_eq!(
        scheduler.block_on(settled).expect("all_settled should settle"),
        Settlement::Fulfilled(vec![
            Settlement::Fulfilled(1),
            Settlement::Rejected("x"),
            Settlement::Fulfilled(3),
        ])
    );
}
