use crate::error::RemoteError;
use crate::host::Unpark;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryIter, channel};
use std::time::Duration;

/// Work submitted from outside the loop thread.
pub(crate) enum Command {
    Schedule {
        callback: Box<dyn FnOnce() + Send>,
        delay: Duration,
    },
}

/// Receiving side of remote submissions, owned by the scheduler.
pub(crate) struct Inbox {
    receiver: Receiver<Command>,
    sender: Sender<Command>,

    /// Number of live [`Remote`] handles.
    handles: Arc<AtomicUsize>,

    unparker: Arc<dyn Unpark>,
}

impl Inbox {
    pub(crate) fn new(unparker: Arc<dyn Unpark>) -> Self {
        let (sender, receiver) = channel();

        Self {
            receiver,
            sender,
            handles: Arc::new(AtomicUsize::new(0)),
            unparker,
        }
    }

    pub(crate) fn remote(&self) -> Remote {
        self.handles.fetch_add(1, Ordering::AcqRel);

        Remote {
            sender: self.sender.clone(),
            unparker: self.unparker.clone(),
            handles: self.handles.clone(),
        }
    }

    pub(crate) fn has_remotes(&self) -> bool {
        self.handles.load(Ordering::Acquire) > 0
    }

    pub(crate) fn try_iter(&self) -> TryIter<'_, Command> {
        self.receiver.try_iter()
    }
}

/// A thread-safe handle for submitting macrotasks to a scheduler.
///
/// `Remote` is the loop's only externally synchronized entry point: other
/// threads (a worker pool, an I/O thread) push callbacks through an mpsc
/// channel and wake the loop through the host [`Unpark`] handle. The
/// callbacks themselves still run on the loop thread, one at a time.
///
/// The delay of a submission is measured from the moment the loop ingests it,
/// which happens at the start of every turn.
///
/// While at least one `Remote` is alive, [`Scheduler::run`](crate::Scheduler::run)
/// keeps waiting for submissions instead of terminating when its queues run dry.
pub struct Remote {
    sender: Sender<Command>,
    unparker: Arc<dyn Unpark>,
    handles: Arc<AtomicUsize>,
}

impl Remote {
    /// Submits `callback` to run as a macrotask after `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Closed`] if the scheduler has been dropped.
    pub fn schedule_macrotask(
        &self,
        callback: impl FnOnce() + Send + 'static,
        delay: Duration,
    ) -> Result<(), RemoteError> {
        self.sender
            .send(Command::Schedule {
                callback: Box::new(callback),
                delay,
            })
            .map_err(|_| RemoteError::Closed)?;

        self.unparker.unpark();
        Ok(())
    }
}

impl Clone for Remote {
    fn clone(&self) -> Self {
        self.handles.fetch_add(1, Ordering::AcqRel);

        Self {
            sender: self.sender.clone(),
            unparker: self.unparker.clone(),
            handles: self.handles.clone(),
        }
    }
}

impl Drop for Remote {
    /// Releases the keep-alive and wakes the loop so it can re-evaluate
    /// whether it should terminate.
    fn drop(&mut self) {
        self.handles.fetch_sub(1, Ordering::AcqRel);
        self.unparker.unpark();
    }
}
