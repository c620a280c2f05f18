use turnstile::event::{DEFAULT_MAX_LISTENERS, ListenerId};
use turnstile::{EventEmitter, Scheduler, SchedulerBuilder, Settlement};

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

type Log = Rc<RefCell<Vec<String>>>;

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

#[test]
fn test_emit_invokes_listeners_in_order() {
    let emitter = EventEmitter::<u32>::new();
    let log: Log = Rc::default();

    for name in ["h1", "h2", "h3"] {
        let log = log.clone();
        let _ = emitter.on("x", move |value: &u32| push(&log, format!("{name}:{value}")));
    }

    assert!(emitter.emit("x", &4).expect("no listener fails"), "x has listeners");
    assert!(!emitter.emit("y", &4).expect("no listener fails"), "y has none");

    assert_eq!(*log.borrow(), ["h1:4", "h2:4", "h3:4"]);
}

#[test]
fn test_once_listener_fires_once() {
    let emitter = EventEmitter::<()>::new();
    let calls = Rc::new(Cell::new(0));

    let counter = calls.clone();
    let subscription = emitter.once("ready", move |_: &()| counter.set(counter.get() + 1));

    emitter.emit("ready", &()).expect("no listener fails");
    emitter.emit("ready", &()).expect("no listener fails");

    assert_eq!(calls.get(), 1, "Once listener should run a single time");
    assert_eq!(emitter.listener_count("ready"), 0, "Once listener should be gone");
    assert!(!subscription.dispose(), "Disposing a fired once listener is a no-op");
}

#[test]
fn test_removal_during_dispatch_keeps_snapshot() {
    let emitter = EventEmitter::<()>::new();
    let log: Log = Rc::default();
    let victim: Rc<Cell<Option<ListenerId>>> = Rc::default();

    {
        let emitter_inner = emitter.clone();
        let victim = victim.clone();
        let log = log.clone();
        let _ = emitter.on("x", move |_: &()| {
            push(&log, "h1");
            if let Some(id) = victim.get() {
                emitter_inner.off("x", id);
            }
        });
    }

    {
        let log = log.clone();
        let subscription = emitter.on("x", move |_: &()| push(&log, "h2"));
        victim.set(Some(subscription.id()));
    }

    emitter.emit("x", &()).expect("no listener fails");
    assert_eq!(
        *log.borrow(),
        ["h1", "h2"],
        "A listener removed mid-dispatch still runs for the in-flight emit"
    );

    log.borrow_mut().clear();
    emitter.emit("x", &()).expect("no listener fails");
    assert_eq!(*log.borrow(), ["h1"], "The removal applies to later emits");
}

#[test]
fn test_listener_added_during_dispatch_waits_for_next_emit() {
    let emitter = EventEmitter::<()>::new();
    let log: Log = Rc::default();

    {
        let emitter_inner = emitter.clone();
        let log = log.clone();
        let _ = emitter.once("x", move |_: &()| {
            push(&log, "adder");
            let log = log.clone();
            let _ = emitter_inner.on("x", move |_: &()| push(&log, "added"));
        });
    }

    emitter.emit("x", &()).expect("no listener fails");
    assert_eq!(*log.borrow(), ["adder"], "New listener must not join the in-flight emit");

    emitter.emit("x", &()).expect("no listener fails");
    assert_eq!(*log.borrow(), ["adder", "added"]);
}

#[test]
fn test_failures_are_isolated_and_collected() {
    let emitter = EventEmitter::<u32>::new();
    let reached = Rc::new(Cell::new(false));

    let failing = emitter.on("x", |_: &u32| Err::<(), _>("first failed"));
    let panicking = emitter.on("x", |value: &u32| {
        assert_eq!(*value, 0, "second listener rejects every non-zero value")
    });

    let flag = reached.clone();
    let _ = emitter.on("x", move |_: &u32| flag.set(true));

    let error = emitter.emit("x", &7).expect_err("two listeners fail");

    assert!(reached.get(), "Later listeners should still run");
    assert_eq!(error.event, "x");
    assert_eq!(error.failures.len(), 2, "Both failures should be collected");
    assert_eq!(error.failures[0].listener, failing.id());
    assert_eq!(error.failures[0].error.to_string(), "first failed");
    assert_eq!(error.failures[1].listener, panicking.id());
    assert!(
        error.failures[1].error.to_string().contains("rejects every non-zero value"),
        "Panic message should be kept"
    );
}

#[test]
fn test_reentrant_emit_runs_once_listener_once() {
    let emitter = EventEmitter::<u32>::new();
    let once_calls = Rc::new(Cell::new(0));
    let regular_calls = Rc::new(Cell::new(0));

    {
        let emitter_inner = emitter.clone();
        let once_calls = once_calls.clone();
        let _ = emitter.once("x", move |depth: &u32| {
            once_calls.set(once_calls.get() + 1);
            if *depth == 0 {
                let _ = emitter_inner.emit("x", &1);
            }
        });
    }

    {
        let regular_calls = regular_calls.clone();
        let _ = emitter.on("x", move |_: &u32| regular_calls.set(regular_calls.get() + 1));
    }

    emitter.emit("x", &0).expect("no listener fails");

    assert_eq!(once_calls.get(), 1, "Once listener must not run twice");
    assert_eq!(regular_calls.get(), 2, "Regular listener runs for both emits");
}

#[test]
fn test_remove_all_listeners() {
    let emitter = EventEmitter::<()>::new();

    let _ = emitter.on("a", |_: &()| ());
    let _ = emitter.on("a", |_: &()| ());
    let _ = emitter.on("b", |_: &()| ());
    let _ = emitter.on("c", |_: &()| ());

    assert_eq!(emitter.event_names(), ["a", "b", "c"]);
    assert_eq!(emitter.remove_all_listeners(Some("a")), 2);
    assert_eq!(emitter.event_names(), ["b", "c"]);
    assert_eq!(emitter.remove_all_listeners(None), 2);
    assert!(emitter.event_names().is_empty());
}

#[test]
fn test_dispose_and_prepend() {
    let emitter = EventEmitter::<()>::new();
    let log: Log = Rc::default();

    let first = {
        let log = log.clone();
        emitter.on("x", move |_: &()| push(&log, "first"))
    };
    {
        let log = log.clone();
        let _ = emitter.prepend_listener("x", move |_: &()| push(&log, "prepended"));
    }

    emitter.emit("x", &()).expect("no listener fails");
    assert_eq!(*log.borrow(), ["prepended", "first"]);

    assert!(first.dispose(), "Dispose should remove the listener");
    assert_eq!(emitter.listener_count("x"), 1);
}

#[test]
fn test_max_listeners_is_configurable() {
    let emitter = EventEmitter::<()>::new();
    assert_eq!(emitter.max_listeners(), DEFAULT_MAX_LISTENERS);

    emitter.set_max_listeners(1);
    let _ = emitter.on("x", |_: &()| ());
    let _ = emitter.on("x", |_: &()| ());

    assert_eq!(
        emitter.listener_count("x"),
        2,
        "Exceeding the limit only warns, it never refuses a listener"
    );
}

#[test]
fn test_next_resolves_with_emitted_arguments() {
    let scheduler = SchedulerBuilder::new().virtual_time().build();
    let emitter = scheduler.create_emitter::<String>();

    let next = emitter.next(&scheduler, "message");
    scheduler.schedule_emit(&emitter, "message", String::from("hello"), Duration::from_millis(10));

    assert_eq!(
        scheduler.block_on(next).expect("next should settle"),
        Settlement::Fulfilled(String::from("hello"))
    );
    assert_eq!(emitter.listener_count("message"), 0);
}

#[test]
fn test_scheduled_emit_failures_go_to_reporter() {
    let failures = Rc::new(RefCell::new(Vec::new()));
    let sink = failures.clone();

    let scheduler: Scheduler = SchedulerBuilder::new()
        .virtual_time()
        .reporter(move |error| sink.borrow_mut().push(error.to_string()))
        .build();

    let emitter = scheduler.create_emitter::<u8>();
    let _ = emitter.on("tick", |_: &u8| Err::<(), _>("nope"));

    scheduler.schedule_emit(&emitter, "tick", 1, Duration::ZERO);
    scheduler.run().expect("loop should terminate");

    let failures = failures.borrow();
    assert_eq!(failures.len(), 1, "The failed emit should be reported");
    assert!(failures[0].contains("event `tick`"), "got {:?}", failures[0]);
}
