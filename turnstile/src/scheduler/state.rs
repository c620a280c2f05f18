use std::cell::Cell;
use tracing::span::EnteredSpan;

/// Whether the loop is currently executing callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No driving method is active. Callbacks may be enqueued freely.
    Idle,

    /// A driving method (`run`, `tick`, `execute`, ...) is on the stack.
    Running,
}

/// Holds the loop in [`LoopState::Running`] and restores
/// [`LoopState::Idle`] when dropped, including during unwinding.
pub(crate) struct RunningGuard<'a> {
    state: &'a Cell<LoopState>,
    _span: EnteredSpan,
}

impl<'a> RunningGuard<'a> {
    pub(crate) fn new(state: &'a Cell<LoopState>, name: &str) -> Self {
        let span = tracing::debug_span!("turnstile", scheduler = %name).entered();

        state.set(LoopState::Running);
        tracing::debug!("loop running");

        Self { state, _span: span }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.state.set(LoopState::Idle);
        tracing::debug!("loop idle");
    }
}
