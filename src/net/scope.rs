//! Request lifetimes.
//!
//! SYSTEM CONTEXT
//! ==============
//! A screen that issues requests owns a `RequestScope`. When the screen goes
//! away the scope is dropped and every request still running under it
//! resolves to `ApiError::Cancelled` without applying its result.
//! `RequestSequence` covers the other race: a search box firing several
//! requests where only the newest response may be shown.

#[cfg(test)]
#[path = "scope_test.rs"]
mod scope_test;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future::{AbortHandle, Abortable};

use super::error::ApiError;

/// Cancellation handle shared by all requests of one owner.
#[derive(Debug, Default)]
pub struct RequestScope {
    handles: Mutex<Vec<AbortHandle>>,
    cancelled: AtomicBool,
}

impl RequestScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` under this scope.
    ///
    /// # Errors
    ///
    /// `Cancelled` if the scope is cancelled before `fut` completes, otherwise
    /// whatever `fut` returns.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let (handle, registration) = AbortHandle::new_pair();
        {
            let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
            if self.is_cancelled() {
                return Err(ApiError::Cancelled);
            }
            handles.retain(|h| !h.is_aborted());
            handles.push(handle);
        }
        Abortable::new(fut, registration).await.unwrap_or(Err(ApiError::Cancelled))
    }

    /// Abort every request running under this scope, and any started later.
    pub fn cancel(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        self.cancelled.store(true, Ordering::SeqCst);
        let count = handles.len();
        for handle in handles.drain(..) {
            handle.abort();
        }
        tracing::debug!(count, "request scope cancelled");
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Monotonic request generations.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

/// Generation issued by [`RequestSequence::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket(u64);

impl RequestSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every earlier ticket.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// `true` while no newer request has begun.
    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
