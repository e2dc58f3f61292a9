//! Coordinated auth session: tokens plus profile.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every login and logout path goes through `AuthSession` so the session and
//! profile stores can never disagree about who is logged in. The HTTP client's
//! global 401 policy uses the same `logout()`.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use tokio::sync::watch;

use super::profile::ProfileStore;
use super::session::{AuthStatus, SessionError, SessionSnapshot, SessionStore};
use crate::net::types::LoginResponse;
use crate::storage::StorageBackend;

/// Shared handle over both stores. Cloning is cheap.
#[derive(Clone)]
pub struct AuthSession {
    session: Arc<SessionStore>,
    profile: Arc<ProfileStore>,
}

impl AuthSession {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            session: Arc::new(SessionStore::new(storage.clone())),
            profile: Arc::new(ProfileStore::new(storage)),
        }
    }

    /// Restore persisted state once at startup.
    ///
    /// The persisted profile is only trusted when a session was restored with it.
    pub fn hydrate(&self) -> AuthStatus {
        let status = self.session.hydrate();
        if status == AuthStatus::Authenticated {
            self.profile.restore();
        } else {
            self.profile.clear_profile();
        }
        status
    }

    /// Record a successful credential exchange and drop any profile of a previous user.
    ///
    /// # Errors
    ///
    /// Returns the session error if the tokens are malformed or cannot be persisted.
    pub fn complete_login(&self, response: LoginResponse) -> Result<(), SessionError> {
        self.session.set_auth(response.user, response.tokens)?;
        self.profile.clear_profile();
        Ok(())
    }

    /// Clear tokens and profile together.
    pub fn logout(&self) {
        self.session.logout();
        self.profile.clear_profile();
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.session.status()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.subscribe()
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }
}
