//! Cooperative cancellation shared by every running operation.
//!
//! A [`CancellationState`] is created once per shell and handed to both the
//! interpreter and the interrupt handler. Each interpreted line opens a
//! [`CancelScope`]; nested work (a script line inside `run`, a pipeline
//! segment) opens nested scopes. A single [`CancellationState::signal_cancel`]
//! is observed by every open scope until the outermost one closes. Nothing is
//! ever interrupted forcibly: long-running loops poll
//! [`CancellationState::is_cancel_pending`] and return early.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Counters {
    requests: u32,
    active_scopes: u32,
}

/// Request and scope counters guarded by one lock.
#[derive(Debug, Default)]
pub struct CancellationState {
    counters: Mutex<Counters>,
}

impl CancellationState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // Counters stay consistent even if a holder panicked.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a cancellable region. Requests signalled while no region was open
    /// are stale and discarded here.
    pub fn enter_scope(&self) -> CancelScope<'_> {
        let mut c = self.lock();
        if c.active_scopes == 0 && c.requests > 0 {
            log::debug!("discarding {} stale cancel request(s)", c.requests);
            c.requests = 0;
        }
        c.active_scopes += 1;
        CancelScope { state: self }
    }

    /// Request cancellation of whatever is running. Callable from any thread.
    pub fn signal_cancel(&self) {
        let mut c = self.lock();
        c.requests = c.requests.saturating_add(1);
        log::debug!("cancel signalled, {} request(s) pending", c.requests);
    }

    /// True while a scope is open and a request has been signalled.
    pub fn is_cancel_pending(&self) -> bool {
        let c = self.lock();
        c.active_scopes > 0 && c.requests > 0
    }

    /// Number of currently open scopes.
    pub fn active_scopes(&self) -> u32 {
        self.lock().active_scopes
    }

    fn exit_scope(&self) {
        let mut c = self.lock();
        if c.active_scopes > 0 && c.requests > 0 {
            log::warn!("Command execution aborted!");
        }
        c.active_scopes = c.active_scopes.saturating_sub(1);
        if c.active_scopes == 0 {
            c.requests = 0;
        }
    }
}

/// Guard for one open cancellable region; closes it on drop.
#[derive(Debug)]
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct CancelScope<'a> {
    state: &'a CancellationState,
}

impl CancelScope<'_> {
    pub fn is_cancel_pending(&self) -> bool {
        self.state.is_cancel_pending()
    }
}

impl Drop for CancelScope<'_> {
    fn drop(&mut self) {
        self.state.exit_scope();
    }
}
