use super::Callback;

use std::cell::RefCell;
use std::collections::VecDeque;

/// A queued microtask.
pub struct Microtask {
    callback: Callback,
}

impl Microtask {
    pub(crate) fn new(callback: Callback) -> Self {
        Self { callback }
    }

    /// Runs the microtask to completion.
    pub fn run(self) {
        (self.callback)()
    }

    pub(crate) fn into_callback(self) -> Callback {
        self.callback
    }
}

/// FIFO queue of microtasks.
///
/// Microtasks carry no ordering key: they run strictly in the order they were
/// enqueued.
#[derive(Default)]
pub struct MicrotaskQueue {
    tasks: VecDeque<Microtask>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Appends a callback to the tail of the queue.
    pub fn enqueue(&mut self, callback: impl FnOnce() + 'static) {
        self.tasks.push_back(Microtask::new(Box::new(callback)));
    }

    /// Removes the head of the queue.
    pub fn pop(&mut self) -> Option<Microtask> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drains the queue held in `queue` until it is empty.
    ///
    /// The borrow on `queue` is released before each microtask is handed to
    /// `run`, so microtasks are free to enqueue further microtasks; those are
    /// executed by this same call before it returns. The drain is exhaustive,
    /// not a single pass over the entries present when it started.
    ///
    /// Returns the number of microtasks executed.
    pub fn drain(queue: &RefCell<Self>, mut run: impl FnMut(Microtask)) -> usize {
        let mut executed = 0;

        loop {
            let next = queue.borrow_mut().pop();
            let Some(task) = next else {
                return executed;
            };

            run(task);
            executed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_drain_runs_nested_enqueues() {
        let queue = Rc::new(RefCell::new(MicrotaskQueue::new()));
        let log = Rc::new(RefCell::new(Vec::new()));

        {
            let queue_inner = queue.clone();
            let log = log.clone();
            queue.borrow_mut().enqueue(move || {
                log.borrow_mut().push("first");
                let log = log.clone();
                queue_inner
                    .borrow_mut()
                    .enqueue(move || log.borrow_mut().push("nested"));
            });
        }
        {
            let log = log.clone();
            queue
                .borrow_mut()
                .enqueue(move || log.borrow_mut().push("second"));
        }

        let executed = MicrotaskQueue::drain(&queue, Microtask::run);

        assert_eq!(executed, 3);
        assert!(queue.borrow().is_empty());
        assert_eq!(*log.borrow(), vec!["first", "second", "nested"]);
    }
}
