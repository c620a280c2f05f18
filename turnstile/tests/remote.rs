use turnstile::error::RemoteError;
use turnstile::{Scheduler, SchedulerBuilder};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn test_remote_submissions_run_on_loop_thread() {
    let scheduler = Scheduler::new();
    let remote = scheduler.remote();
    let counter = Arc::new(AtomicUsize::new(0));
    let threads = Arc::new(Mutex::new(Vec::new()));

    let producer = {
        let counter = counter.clone();
        let threads = threads.clone();
        thread::spawn(move || {
            for _ in 0..3 {
                let counter = counter.clone();
                let threads = threads.clone();
                remote
                    .schedule_macrotask(
                        move || {
                            counter.fetch_add(1, Ordering::SeqCst);
                            threads
                                .lock()
                                .expect("lock poisoned")
                                .push(thread::current().id());
                        },
                        Duration::ZERO,
                    )
                    .expect("scheduler is alive");
            }
        })
    };

    scheduler.run().expect("loop should end once the remote is dropped");
    producer.join().expect("producer thread panicked");

    assert_eq!(counter.load(Ordering::SeqCst), 3, "Every submission should run");

    let loop_thread = thread::current().id();
    assert!(
        threads
            .lock()
            .expect("lock poisoned")
            .iter()
            .all(|id| *id == loop_thread),
        "Callbacks should run on the loop thread"
    );
}

#[test]
fn test_remote_keeps_loop_alive() {
    let scheduler = SchedulerBuilder::new().build();
    let remote = scheduler.remote();
    let counter = Arc::new(AtomicUsize::new(0));

    let producer = {
        let counter = counter.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote
                .schedule_macrotask(
                    move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    },
                    Duration::from_millis(5),
                )
                .expect("scheduler is alive");
        })
    };

    scheduler.run().expect("loop should end once the remote is dropped");
    producer.join().expect("producer thread panicked");

    assert_eq!(
        counter.load(Ordering::SeqCst),
        1,
        "Loop should have waited for the late submission"
    );
}

#[test]
fn test_remote_fails_once_scheduler_is_gone() {
    let scheduler = Scheduler::new();
    let remote = scheduler.remote();

    drop(scheduler);

    assert_eq!(
        remote.schedule_macrotask(|| (), Duration::ZERO),
        Err(RemoteError::Closed)
    );
}
