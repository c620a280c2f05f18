use super::listener::{Detach, HandlerOutput, Listener, ListenerId, Subscription};
use crate::error::{EmitError, HandlerFailure};
use crate::future::Future;
use crate::scheduler::Scheduler;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::fmt;
use std::rc::{Rc, Weak};

/// Listener count per event above which a leak warning is logged.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

struct Inner<A> {
    listeners: RefCell<BTreeMap<String, Vec<Rc<Listener<A>>>>>,
    next_id: Cell<u64>,
    max_listeners: Cell<usize>,
    warned: RefCell<BTreeSet<String>>,
}

impl<A> Detach for Inner<A> {
    fn detach(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();

        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let Some(position) = list.iter().position(|listener| listener.id() == id) else {
            return false;
        };

        list.remove(position);
        if list.is_empty() {
            listeners.remove(event);
        }

        true
    }
}

/// A table of named events and their listeners.
///
/// `EventEmitter` is a cheap, clonable handle: clones share one listener
/// table. Handlers receive the emitted arguments by reference and return
/// either `()` or a `Result<(), E>` (see [`HandlerOutput`]).
///
/// # Examples
///
/// ```rust,ignore
/// let emitter = scheduler.create_emitter::<u32>();
///
/// let subscription = emitter.on("tick", |n| println!("tick {n}"));
/// emitter.emit("tick", &1)?;
///
/// subscription.dispose();
/// assert!(!emitter.emit("tick", &2)?);
/// ```
pub struct EventEmitter<A> {
    inner: Rc<Inner<A>>,
}

impl<A> Clone for EventEmitter<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: 'static> EventEmitter<A> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                listeners: RefCell::new(BTreeMap::new()),
                next_id: Cell::new(0),
                max_listeners: Cell::new(DEFAULT_MAX_LISTENERS),
                warned: RefCell::new(BTreeSet::new()),
            }),
        }
    }

    /// Appends `handler` to the listeners of `event`.
    pub fn on<R: HandlerOutput>(
        &self,
        event: impl Into<String>,
        handler: impl Fn(&A) -> R + 'static,
    ) -> Subscription {
        self.add(event.into(), handler, false, false)
    }

    /// Like [`on`](Self::on), but the listener is removed right before its
    /// first invocation.
    pub fn once<R: HandlerOutput>(
        &self,
        event: impl Into<String>,
        handler: impl Fn(&A) -> R + 'static,
    ) -> Subscription {
        self.add(event.into(), handler, true, false)
    }

    /// Like [`on`](Self::on), but the listener goes to the front of the list.
    pub fn prepend_listener<R: HandlerOutput>(
        &self,
        event: impl Into<String>,
        handler: impl Fn(&A) -> R + 'static,
    ) -> Subscription {
        self.add(event.into(), handler, false, true)
    }

    fn add<R: HandlerOutput>(
        &self,
        event: String,
        handler: impl Fn(&A) -> R + 'static,
        once: bool,
        prepend: bool,
    ) -> Subscription {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let listener = Rc::new(Listener::new(
            id,
            once,
            Box::new(move |args: &A| handler(args).into_outcome()),
        ));

        let count = {
            let mut listeners = self.inner.listeners.borrow_mut();
            let list = listeners.entry(event.clone()).or_default();
            if prepend {
                list.insert(0, listener);
            } else {
                list.push(listener);
            }
            list.len()
        };

        tracing::trace!(event = %event, listener = %id, once, "listener added");
        self.check_limit(&event, count);

        let weak = Rc::downgrade(&self.inner);
        let emitter: Weak<dyn Detach> = weak;
        Subscription::new(emitter, event, id)
    }

    fn check_limit(&self, event: &str, count: usize) {
        let max = self.inner.max_listeners.get();
        if max == 0 || count <= max {
            return;
        }

        if self.inner.warned.borrow_mut().insert(event.to_owned()) {
            tracing::warn!(
                event,
                count,
                max,
                "possible listener leak: more listeners than the configured maximum"
            );
        }
    }

    /// Removes the registration `id` from `event`.
    ///
    /// An emit already in flight still invokes it.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let removed = self.inner.detach(event, id);
        if removed {
            tracing::trace!(event, listener = %id, "listener removed");
        }
        removed
    }

    /// Removes every listener of `event`, or of every event when `None`.
    ///
    /// Returns the number of listeners removed.
    pub fn remove_all_listeners(&self, event: Option<&str>) -> usize {
        let mut listeners = self.inner.listeners.borrow_mut();

        let removed = match event {
            Some(event) => listeners.remove(event).map_or(0, |list| list.len()),
            None => {
                let removed = listeners.values().map(Vec::len).sum();
                listeners.clear();
                removed
            }
        };

        tracing::trace!(event = ?event, removed, "listeners cleared");
        removed
    }

    /// Invokes every listener of `event`, in order, with `args`.
    ///
    /// Returns `Ok(false)` when `event` had no listeners.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] with one entry per failed listener once every
    /// listener of the snapshot ran. A panicking listener counts as failed.
    pub fn emit(&self, event: &str, args: &A) -> Result<bool, EmitError> {
        let snapshot = self.inner.listeners.borrow().get(event).cloned();

        let Some(snapshot) = snapshot else {
            tracing::trace!(event, "emit without listeners");
            return Ok(false);
        };

        tracing::trace!(event, listeners = snapshot.len(), "emit");

        let mut failures = Vec::new();

        for listener in &snapshot {
            if listener.is_once() {
                self.inner.detach(event, listener.id());
            }

            let Some(outcome) = listener.call(args) else {
                continue;
            };

            if let Err(error) = outcome {
                tracing::debug!(event, listener = %listener.id(), %error, "listener failed");
                failures.push(HandlerFailure {
                    listener: listener.id(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(true)
        } else {
            Err(EmitError {
                event: event.to_owned(),
                failures,
            })
        }
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .listeners
            .borrow()
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Names of events with at least one listener, sorted.
    pub fn event_names(&self) -> Vec<String> {
        self.inner.listeners.borrow().keys().cloned().collect()
    }

    /// Sets the leak warning threshold. `0` disables the warning.
    pub fn set_max_listeners(&self, max: usize) {
        self.inner.max_listeners.set(max);
    }

    pub fn max_listeners(&self) -> usize {
        self.inner.max_listeners.get()
    }

    /// A future fulfilled with the arguments of the next emit of `event`.
    pub fn next(&self, scheduler: &Scheduler, event: impl Into<String>) -> Future<A, Infallible>
    where
        A: Clone,
    {
        let (future, resolver) = Future::pending(scheduler);

        let _subscription = self.once(event, move |args: &A| resolver.resolve(args.clone()));

        future
    }
}

impl<A: 'static> Default for EventEmitter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for EventEmitter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.inner.listeners.borrow();
        let mut map = f.debug_map();
        for (event, list) in listeners.iter() {
            map.entry(event, &list.len());
        }
        map.finish()
    }
}
