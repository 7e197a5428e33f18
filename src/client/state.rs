//! # Request State
//!
//! Every view runs its requests through the same small state machine:
//!
//! ```text
//! Idle ──trigger──▶ Pending ──▶ Succeeded(T)
//!                           └─▶ Failed(ClientError)
//! ```
//!
//! `Succeeded` and `Failed` are terminal for that request. The next explicit trigger
//! clears them and starts over. A local validation failure goes straight to `Failed`
//! without passing through `Pending`.
//!
//! State lives in a `tokio::sync::watch` channel so a front-end can subscribe and
//! disable its controls while a request is pending.

use tokio::sync::watch;

use crate::common::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState<T> {
    Idle,
    Pending,
    Succeeded(T),
    Failed(ClientError),
}

impl<T> RequestState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, RequestState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    pub fn succeeded(&self) -> Option<&T> {
        match self {
            RequestState::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            RequestState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Owner of one view's [`RequestState`].
pub struct RequestTracker<T> {
    tx: watch::Sender<RequestState<T>>,
}

impl<T: Clone> RequestTracker<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RequestState::Idle);
        Self { tx }
    }

    /// Current state.
    pub fn snapshot(&self) -> RequestState<T> {
        self.tx.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.tx.borrow().is_pending()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.tx.subscribe()
    }

    /// Back to `Idle`, dropping any previous result or error.
    pub fn reset(&self) {
        self.tx.send_replace(RequestState::Idle);
    }

    /// Record a failure that happened before anything was sent.
    pub fn reject(&self, error: ClientError) -> ClientError {
        self.tx.send_replace(RequestState::Failed(error.clone()));
        error
    }

    /// Enter `Pending`. The returned guard must be settled; if it is dropped first
    /// (the request was abandoned) the state falls back to `Idle`.
    pub fn begin(&self) -> PendingGuard<'_, T> {
        self.tx.send_replace(RequestState::Pending);
        PendingGuard {
            tracker: self,
            settled: false,
        }
    }
}

impl<T: Clone> Default for RequestTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PendingGuard<'a, T: Clone> {
    tracker: &'a RequestTracker<T>,
    settled: bool,
}

impl<T: Clone> PendingGuard<'_, T> {
    /// Move to the terminal state for `result` and hand the result back.
    pub fn settle(mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        self.settled = true;
        let state = match &result {
            Ok(value) => RequestState::Succeeded(value.clone()),
            Err(e) => RequestState::Failed(e.clone()),
        };
        self.tracker.tx.send_replace(state);
        result
    }
}

impl<T: Clone> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.tx.send_replace(RequestState::Idle);
        }
    }
}
