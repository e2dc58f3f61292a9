//! Cached role/organization projection for the current session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The profile decides which dashboard variant and menu a user sees. It is
//! fetched lazily after login and may be restored from storage on startup.
//!
//! TRADE-OFFS
//! ==========
//! Concurrent loads are not deduplicated: whichever response resolves last
//! wins. Every `clear_profile` starts a new generation, and a load that began
//! in an earlier generation is discarded when it resolves, so a response
//! arriving after logout never reaches memory or storage.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::net::error::ApiError;
use crate::net::types::UserProfile;
use crate::storage::{self, StorageBackend, StorageError};

/// Storage namespace of the persisted profile record.
pub const PROFILE_STORAGE_KEY: &str = "user-profile-storage";

/// Source of profile payloads. Implemented by the API client.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError>;
}

/// Point-in-time view of the profile store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileSnapshot {
    pub profile: Option<UserProfile>,
    in_flight: usize,
    generation: u64,
}

impl ProfileSnapshot {
    /// `true` while at least one load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// Keeps the loading flag raised for the lifetime of one load, including
/// loads whose future is dropped before completing.
struct InFlight<'a>(&'a watch::Sender<ProfileSnapshot>);

impl<'a> InFlight<'a> {
    fn begin(state: &'a watch::Sender<ProfileSnapshot>) -> Self {
        state.send_modify(|snap| snap.in_flight += 1);
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|snap| snap.in_flight = snap.in_flight.saturating_sub(1));
    }
}

pub struct ProfileStore {
    storage: Arc<dyn StorageBackend>,
    state: watch::Sender<ProfileSnapshot>,
}

impl ProfileStore {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        let (state, _) = watch::channel(ProfileSnapshot::default());
        Self { storage, state }
    }

    /// Fetch the profile and store it.
    ///
    /// Failures are logged and clear the profile instead of propagating, so
    /// callers check the returned value (or [`Self::profile`]) for `None`.
    /// A load overtaken by [`Self::clear_profile`] returns `None` and leaves
    /// the store untouched.
    pub async fn load_profile(&self, fetcher: &dyn ProfileFetcher) -> Option<UserProfile> {
        let generation = self.state.borrow().generation;
        let _in_flight = InFlight::begin(&self.state);

        let result = fetcher.fetch_profile().await;
        let mut applied = None;
        // Generation check, persistence and the state write share the channel
        // lock so a concurrent clear cannot interleave between them.
        self.state.send_if_modified(|snap| {
            if snap.generation != generation {
                tracing::debug!(started = generation, current = snap.generation, "discarding stale profile load");
                return false;
            }
            match &result {
                Ok(profile) => {
                    if let Err(e) = storage::save_json(self.storage.as_ref(), PROFILE_STORAGE_KEY, profile) {
                        tracing::warn!(namespace = PROFILE_STORAGE_KEY, error = %e, "failed to persist profile");
                    }
                    applied = Some(profile.clone());
                }
                Err(e) => {
                    tracing::error!(error = %e, "profile load failed");
                    self.remove_persisted();
                }
            }
            snap.profile.clone_from(&applied);
            true
        });
        applied
    }

    /// Restore a previously persisted profile. Corrupt records are discarded.
    pub fn restore(&self) -> Option<UserProfile> {
        let restored = match storage::load_json::<UserProfile>(self.storage.as_ref(), PROFILE_STORAGE_KEY) {
            Ok(profile) => profile,
            Err(StorageError::Json(e)) => {
                tracing::warn!(namespace = PROFILE_STORAGE_KEY, error = %e, "discarding corrupt persisted profile");
                self.remove_persisted();
                None
            }
            Err(e) => {
                tracing::warn!(namespace = PROFILE_STORAGE_KEY, error = %e, "failed to read persisted profile");
                None
            }
        };
        if restored.is_some() {
            self.state.send_modify(|snap| snap.profile.clone_from(&restored));
        }
        restored
    }

    /// Drop the cached profile, in memory and in storage, and invalidate
    /// every load still in flight.
    pub fn clear_profile(&self) {
        self.state.send_if_modified(|snap| {
            snap.generation = snap.generation.wrapping_add(1);
            self.remove_persisted();
            snap.profile.take().is_some()
        });
    }

    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.state.borrow().profile.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProfileSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProfileSnapshot> {
        self.state.subscribe()
    }

    fn remove_persisted(&self) {
        if let Err(e) = self.storage.remove(PROFILE_STORAGE_KEY) {
            tracing::warn!(namespace = PROFILE_STORAGE_KEY, error = %e, "failed to remove persisted profile");
        }
    }
}
