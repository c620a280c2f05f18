use crate::future::FutureId;

/// Rejected futures that nobody has reacted to yet.
///
/// Entries are added when a future rejects with an empty reaction list and
/// removed as soon as a reaction is registered. Whatever is left at the end
/// of a microtask drain is reported as unhandled.
#[derive(Default)]
pub(crate) struct RejectionTracker {
    pending: Vec<(FutureId, String)>,
}

impl RejectionTracker {
    pub(crate) fn track(&mut self, future: FutureId, reason: String) {
        self.pending.push((future, reason));
    }

    pub(crate) fn untrack(&mut self, future: FutureId) {
        self.pending.retain(|(id, _)| *id != future);
    }

    pub(crate) fn take(&mut self) -> Vec<(FutureId, String)> {
        std::mem::take(&mut self.pending)
    }
}
