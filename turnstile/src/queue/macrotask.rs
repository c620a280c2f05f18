use super::Callback;

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Instant;

static NEXT_QUEUE: AtomicU64 = AtomicU64::new(0);

/// Identifier of a scheduled macrotask, unique within one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a scheduled entry, shared between the queue and its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// Waiting in the queue.
    Queued,

    /// Popped and currently executing.
    Running,

    /// Executed; the token is inert.
    Done,

    /// Cancelled before it could run (or, for repeating entries, stopped).
    Cancelled,
}

/// State shared by every queue entry created for the same token.
pub(crate) struct Slot {
    id: TaskId,

    /// Identity of the queue that issued the token.
    queue: u64,
    status: Cell<Status>,

    /// Repeating entries (intervals) may be cancelled while running.
    repeating: bool,
}

impl Slot {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.status.get() == Status::Cancelled
    }
}

/// Cancellation token returned when a macrotask is scheduled.
///
/// Pass it to [`Scheduler::cancel`](crate::Scheduler::cancel) (or
/// [`MacrotaskQueue::cancel`]) to remove the entry before it runs.
#[derive(Clone)]
pub struct TaskToken {
    slot: Rc<Slot>,
}

impl TaskToken {
    pub fn id(&self) -> TaskId {
        self.slot.id
    }

    /// Returns `true` while the entry is still waiting to run.
    pub fn is_pending(&self) -> bool {
        self.slot.status.get() == Status::Queued
    }

    pub fn is_cancelled(&self) -> bool {
        self.slot.is_cancelled()
    }

    pub(crate) fn slot(&self) -> Rc<Slot> {
        self.slot.clone()
    }
}

impl fmt::Debug for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskToken")
            .field("id", &self.slot.id)
            .field("status", &self.slot.status.get())
            .finish()
    }
}

/// An entry of the macrotask queue.
///
/// Ordered by `ready_at`, then by insertion sequence, so that a
/// `BinaryHeap<Entry>` pops the earliest entry first and equal keys come out
/// in FIFO order.
struct Entry {
    ready_at: Instant,
    seq: u64,
    slot: Rc<Slot>,
    callback: Callback,
}

impl Eq for Entry {}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.ready_at == other.ready_at && self.seq == other.seq
    }
}

impl Ord for Entry {
    /// Reversed comparison: the heap behaves as a min-heap on
    /// `(ready_at, seq)`.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .ready_at
            .cmp(&self.ready_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A macrotask released by [`MacrotaskQueue::pop_ready`].
pub struct Macrotask {
    slot: Rc<Slot>,
    callback: Callback,
}

impl Macrotask {
    pub fn id(&self) -> TaskId {
        self.slot.id
    }

    /// Runs the callback and marks the entry as done.
    pub fn run(self) {
        let (callback, finish) = self.into_parts();
        callback();
        finish.complete();
    }

    pub(crate) fn into_parts(self) -> (Callback, Completion) {
        (self.callback, Completion { slot: self.slot })
    }
}

/// Finalizes a popped entry once its callback returned (or panicked).
pub(crate) struct Completion {
    slot: Rc<Slot>,
}

impl Completion {
    /// `Running` becomes `Done`; an interval that re-armed itself (`Queued`)
    /// or was cancelled while running keeps its status.
    pub(crate) fn complete(self) {
        if self.slot.status.get() == Status::Running {
            self.slot.status.set(Status::Done);
        }
    }
}

/// An entry whose ready time lies beyond what [`Instant`] can represent.
struct Dormant {
    slot: Rc<Slot>,
    _callback: Callback,
}

/// Time-ordered queue of macrotasks.
///
/// Cancellation is lazy: a cancelled entry stays in the heap but is skipped
/// (and dropped) when it reaches the top. Once cancelled entries outnumber
/// live ones the heap is compacted. [`len`](Self::len) only counts live
/// entries.
///
/// Entries that can never become ready (their deadline overflows `Instant`)
/// are kept aside: they count towards [`len`](Self::len) and can be
/// cancelled, but never run and never produce a deadline.
pub struct MacrotaskQueue {
    id: u64,
    heap: BinaryHeap<Entry>,
    dormant: Vec<Dormant>,
    next_seq: u64,
    next_id: u64,
    live: usize,
    cancelled: usize,
}

impl MacrotaskQueue {
    pub fn new() -> Self {
        Self {
            id: NEXT_QUEUE.fetch_add(1, AtomicOrdering::Relaxed),
            heap: BinaryHeap::new(),
            dormant: Vec::new(),
            next_seq: 0,
            next_id: 0,
            live: 0,
            cancelled: 0,
        }
    }

    /// Inserts `callback` keyed by `ready_at`.
    ///
    /// Entries with equal `ready_at` are released in insertion order.
    pub fn enqueue(&mut self, callback: impl FnOnce() + 'static, ready_at: Instant) -> TaskToken {
        self.enqueue_boxed(Box::new(callback), Some(ready_at), false)
    }

    /// `None` stands for a deadline too far away to represent.
    pub(crate) fn enqueue_boxed(
        &mut self,
        callback: Callback,
        ready_at: Option<Instant>,
        repeating: bool,
    ) -> TaskToken {
        let token = self.reserve(repeating);
        token.slot.status.set(Status::Queued);
        self.push(token.slot(), callback, ready_at);

        token
    }

    /// Allocates a token without queueing anything yet. The entry is armed
    /// later through [`requeue`](Self::requeue).
    pub(crate) fn reserve(&mut self, repeating: bool) -> TaskToken {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        TaskToken {
            slot: Rc::new(Slot {
                id,
                queue: self.id,
                status: Cell::new(Status::Done),
                repeating,
            }),
        }
    }

    /// Re-inserts an existing slot (interval re-arm). Ignored if the slot was
    /// cancelled in the meantime.
    pub(crate) fn requeue(&mut self, slot: Rc<Slot>, callback: Callback, ready_at: Option<Instant>) {
        if slot.is_cancelled() {
            return;
        }

        slot.status.set(Status::Queued);
        self.push(slot, callback, ready_at);
    }

    fn push(&mut self, slot: Rc<Slot>, callback: Callback, ready_at: Option<Instant>) {
        self.live += 1;

        let Some(ready_at) = ready_at else {
            tracing::debug!(task = %slot.id, "macrotask deadline unrepresentable, never ready");
            self.dormant.push(Dormant {
                slot,
                _callback: callback,
            });
            return;
        };

        let seq = self.next_seq;
        self.next_seq += 1;

        tracing::trace!(task = %slot.id, seq, "macrotask enqueued");

        self.heap.push(Entry {
            ready_at,
            seq,
            slot,
            callback,
        });
    }

    /// Removes and returns the earliest entry with `ready_at <= now`.
    pub fn pop_ready(&mut self, now: Instant) -> Option<Macrotask> {
        self.purge_cancelled();

        if self.heap.peek()?.ready_at > now {
            return None;
        }

        let entry = self.heap.pop()?;
        self.live -= 1;
        entry.slot.status.set(Status::Running);

        Some(Macrotask {
            slot: entry.slot,
            callback: entry.callback,
        })
    }

    /// Returns the `ready_at` of the earliest live entry.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.purge_cancelled();
        self.heap.peek().map(|entry| entry.ready_at)
    }

    /// Cancels the entry behind `token`.
    ///
    /// Returns `true` if an unexecuted entry was removed, or a running
    /// repeating entry was stopped. Cancelling an entry that already ran, or
    /// a token issued by another queue, is a no-op returning `false`.
    pub fn cancel(&mut self, token: &TaskToken) -> bool {
        let slot = &token.slot;

        if slot.queue != self.id {
            tracing::debug!(task = %slot.id, "ignoring token from another queue");
            return false;
        }

        match slot.status.get() {
            Status::Queued => {
                slot.status.set(Status::Cancelled);
                self.live -= 1;
                self.cancelled += 1;
                tracing::trace!(task = %slot.id, "macrotask cancelled");

                if self.cancelled > self.live {
                    self.compact();
                }
                true
            }
            Status::Running if slot.repeating => {
                slot.status.set(Status::Cancelled);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn purge_cancelled(&mut self) {
        while self
            .heap
            .peek()
            .is_some_and(|entry| entry.slot.is_cancelled())
        {
            self.heap.pop();
            self.cancelled -= 1;
        }
    }

    /// Drops every cancelled entry along with its callback.
    fn compact(&mut self) {
        self.heap.retain(|entry| !entry.slot.is_cancelled());
        self.dormant.retain(|entry| !entry.slot.is_cancelled());
        tracing::trace!(dropped = self.cancelled, "macrotask queue compacted");
        self.cancelled = 0;
    }
}

impl Default for MacrotaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
