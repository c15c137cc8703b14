//! Chain control handles.
//!
//! A [`ChainControl`] links a message to the interceptor chain currently
//! driving it. Interceptors only ever see the message, so pause and abort
//! requests travel through this shared handle rather than through a direct
//! reference to the chain (which is mutably borrowed while it executes).
//!
//! The chain honors requests *between* interceptor invocations: aborting
//! never interrupts an interceptor already mid-execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ControlState {
    pause_requested: AtomicBool,
    abort_requested: AtomicBool,
}

/// Shared handle for requesting pause or abort of a running chain.
///
/// Cloning is cheap; all clones observe the same state. The handle is
/// typically reached through `Message::chain_control` from inside an
/// interceptor.
///
/// # Example
///
/// ```
/// use hermes_core::ChainControl;
///
/// let control = ChainControl::new();
/// control.pause();
/// assert!(control.take_pause_request());
/// assert!(!control.take_pause_request(), "requests are consumed once");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChainControl {
    state: Arc<ControlState>,
}

impl ChainControl {
    /// Creates a fresh control handle with no pending requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the chain pause before invoking its next interceptor.
    ///
    /// Used by transports that must suspend processing while awaiting I/O.
    /// The chain stops without error; re-invoking it resumes at the stored
    /// cursor position.
    pub fn pause(&self) {
        self.state.pause_requested.store(true, Ordering::SeqCst);
    }

    /// Requests that the chain abort before invoking its next interceptor.
    ///
    /// Once the chain observes the request it stays aborted for its
    /// lifetime, even across resume attempts.
    pub fn abort(&self) {
        self.state.abort_requested.store(true, Ordering::SeqCst);
    }

    /// Consumes a pending pause request, returning `true` if one was set.
    pub fn take_pause_request(&self) -> bool {
        self.state.pause_requested.swap(false, Ordering::SeqCst)
    }

    /// Returns `true` if an abort has been requested.
    ///
    /// Abort requests are not consumed; the chain records the aborted
    /// state itself and never runs again.
    #[must_use]
    pub fn abort_requested(&self) -> bool {
        self.state.abort_requested.load(Ordering::SeqCst)
    }
}
