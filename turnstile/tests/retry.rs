use turnstile::tools::retry;
use turnstile::{Future, SchedulerBuilder, Settlement};

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

#[test]
fn test_retry_succeeds_before_limit() {
    let scheduler = SchedulerBuilder::new().virtual_time().build();
    let attempts = Rc::new(Cell::new(0));

    let result = {
        let attempts = attempts.clone();
        let handle = scheduler.clone();
        retry(&scheduler, 5, move || {
            let n = attempts.get();
            attempts.set(n + 1);
            if n < 2 {
                Future::rejected(&handle, "fail")
            } else {
                Future::resolved(&handle, 42)
            }
        })
        .run()
    };

    assert_eq!(
        scheduler.block_on(result).expect("retry should settle"),
        Settlement::Fulfilled(42),
        "Retry should succeed before limit"
    );
    assert_eq!(attempts.get(), 3, "Should have made 3 attempts");
}

#[test]
fn test_retry_fails_after_limit() {
    let scheduler = SchedulerBuilder::new().virtual_time().build();
    let attempts = Rc::new(Cell::new(0));

    let result = {
        let attempts = attempts.clone();
        let handle = scheduler.clone();
        retry(&scheduler, 3, move || {
            attempts.set(attempts.get() + 1);
            Future::<usize, _>::rejected(&handle, format!("fail {}", attempts.get()))
        })
        .run()
    };

    assert_eq!(
        scheduler.block_on(result).expect("retry should settle"),
        Settlement::Rejected(String::from("fail 4")),
        "Retry should fail with the last error"
    );
    assert_eq!(attempts.get(), 4, "Should have made 4 attempts");
}

#[test]
fn test_retry_with_interval() {
    let scheduler = SchedulerBuilder::new().virtual_time().build();
    let interval = Duration::from_millis(20);
    let starts: Rc<RefCell<Vec<Instant>>> = Rc::default();

    let result = {
        let starts = starts.clone();
        let handle = scheduler.clone();
        retry(&scheduler, 3, move || {
            starts.borrow_mut().push(handle.now());
            if starts.borrow().len() < 3 {
                Future::rejected(&handle, "fail")
            } else {
                Future::resolved(&handle, 77)
            }
        })
        .set_interval(interval)
        .run()
    };

    assert_eq!(
        scheduler.block_on(result).expect("retry should settle"),
        Settlement::Fulfilled(77),
        "Retry with interval should succeed"
    );

    let starts = starts.borrow();
    assert_eq!(starts.len(), 3, "Should have made 3 attempts");
    for pair in starts.windows(2) {
        assert!(
            pair[1] - pair[0] >= interval,
            "Gap between attempts too short: {:?}",
            pair[1] - pair[0]
        );
    }
}
