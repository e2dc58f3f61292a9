//! Bearer-token session for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store is the single authority for the access/refresh pair. The
//! HTTP layer reads tokens through it, the route guard watches it, and the
//! persisted `auth-storage` record is the only durable copy.
//!
//! LIFECYCLE
//! =========
//! `Uninitialized` (not hydrated) -> `Hydrated-Unauthenticated` <-> `Hydrated-Authenticated`.
//! Hydration happens exactly once; nothing ever returns to `Uninitialized`.
//! Until hydration completes the authentication verdict is `Pending`, so a
//! guard never redirects a returning user before their token has been read.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::net::types::{TokenPair, UserSummary};
use crate::storage::{self, StorageBackend, StorageError};

/// Storage namespace of the persisted session record.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

/// Error returned by session mutations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("malformed {kind} token")]
    MalformedToken { kind: &'static str },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Who is logged in. An access token cannot exist without its user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn { user: UserSummary, tokens: TokenPair },
}

/// Authentication verdict consumed by route guards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    /// Persisted state has not been restored yet.
    Pending,
    Unauthenticated,
    Authenticated,
}

/// Point-in-time view of the store, as published to subscribers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Session,
    pub hydrated: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        match (self.hydrated, &self.session) {
            (false, _) => AuthStatus::Pending,
            (true, Session::LoggedOut) => AuthStatus::Unauthenticated,
            (true, Session::LoggedIn { .. }) => AuthStatus::Authenticated,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    user: UserSummary,
    tokens: TokenPair,
}

/// Session store over an injected storage backend.
pub struct SessionStore {
    storage: Arc<dyn StorageBackend>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self { storage, state }
    }

    /// Restore the persisted session and mark the store hydrated.
    ///
    /// A login that completed before hydration wins over the persisted record.
    /// A record that fails to decode is discarded.
    pub fn hydrate(&self) -> AuthStatus {
        if self.is_hydrated() {
            return self.status();
        }

        let restored = match storage::load_json::<PersistedSession>(self.storage.as_ref(), SESSION_STORAGE_KEY) {
            Ok(record) => record,
            Err(StorageError::Json(e)) => {
                tracing::warn!(namespace = SESSION_STORAGE_KEY, error = %e, "discarding corrupt persisted session");
                if let Err(e) = self.storage.remove(SESSION_STORAGE_KEY) {
                    tracing::warn!(namespace = SESSION_STORAGE_KEY, error = %e, "failed to remove corrupt session");
                }
                None
            }
            Err(e) => {
                tracing::warn!(namespace = SESSION_STORAGE_KEY, error = %e, "failed to read persisted session");
                None
            }
        };

        if let Some(record) = restored {
            if valid_token(&record.tokens.access) && valid_token(&record.tokens.refresh) {
                self.state.send_if_modified(|snap| {
                    if snap.session != Session::LoggedOut {
                        return false;
                    }
                    snap.session = Session::LoggedIn { user: record.user, tokens: record.tokens };
                    true
                });
            } else {
                tracing::warn!(namespace = SESSION_STORAGE_KEY, "ignoring persisted session with malformed tokens");
            }
        }

        self.set_has_hydrated(true);
        let status = self.status();
        tracing::debug!(?status, "session hydrated");
        status
    }

    /// Set the hydration flag. It only ever moves from `false` to `true`.
    ///
    /// On the transition a session established in memory is written back to
    /// storage so the persisted record and the in-memory state agree from then on.
    pub fn set_has_hydrated(&self, flag: bool) {
        if !flag {
            if self.is_hydrated() {
                tracing::warn!("ignoring attempt to revert session hydration");
            }
            return;
        }

        let changed = self.state.send_if_modified(|snap| {
            if snap.hydrated {
                return false;
            }
            snap.hydrated = true;
            true
        });
        let session = self.snapshot().session;
        if changed && session != Session::LoggedOut {
            if let Err(e) = self.persist(&session) {
                tracing::warn!(namespace = SESSION_STORAGE_KEY, error = %e, "failed to sync session after hydration");
            }
        }
    }

    /// Record a successful credential exchange.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MalformedToken`] for an empty token or one that is not a
    /// valid header value, or a storage error if the session cannot be persisted. State is
    /// unchanged on error.
    pub fn set_auth(&self, user: UserSummary, tokens: TokenPair) -> Result<(), SessionError> {
        if !valid_token(&tokens.access) {
            return Err(SessionError::MalformedToken { kind: "access" });
        }
        if !valid_token(&tokens.refresh) {
            return Err(SessionError::MalformedToken { kind: "refresh" });
        }

        let user_id = user.id;
        let session = Session::LoggedIn { user, tokens };
        self.persist(&session)?;
        self.state.send_modify(|snap| snap.session = session);
        tracing::info!(user_id, "session established");
        Ok(())
    }

    /// Clear the user and both tokens, in memory and in storage. Idempotent.
    pub fn logout(&self) {
        if let Err(e) = self.storage.remove(SESSION_STORAGE_KEY) {
            tracing::warn!(namespace = SESSION_STORAGE_KEY, error = %e, "failed to remove persisted session");
        }
        let changed = self.state.send_if_modified(|snap| {
            if snap.session == Session::LoggedOut {
                return false;
            }
            snap.session = Session::LoggedOut;
            true
        });
        if changed {
            tracing::info!("session cleared");
        }
    }

    /// `false` until hydration completes, then whether a user is logged in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.state.borrow().status()
    }

    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.state.borrow().hydrated
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserSummary> {
        match &self.state.borrow().session {
            Session::LoggedIn { user, .. } => Some(user.clone()),
            Session::LoggedOut => None,
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        match &self.state.borrow().session {
            Session::LoggedIn { tokens, .. } => Some(tokens.access.clone()),
            Session::LoggedOut => None,
        }
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        match &self.state.borrow().session {
            Session::LoggedIn { tokens, .. } => Some(tokens.refresh.clone()),
            Session::LoggedOut => None,
        }
    }

    /// Observe every change to the hydration flag or the session.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        match session {
            Session::LoggedOut => self.storage.remove(SESSION_STORAGE_KEY),
            Session::LoggedIn { user, tokens } => storage::save_json(
                self.storage.as_ref(),
                SESSION_STORAGE_KEY,
                &PersistedSession { user: user.clone(), tokens: tokens.clone() },
            ),
        }
    }
}

/// Non-empty and made only of visible ASCII, so it can ride in an `Authorization` header.
fn valid_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_graphic())
}
