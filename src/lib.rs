//! # profmed-client
//!
//! Headless client core for the ProfMed medical-examination backend.
//!
//! This crate owns the session bootstrap protocol (persisted bearer tokens,
//! one-time hydration, route guarding), the role/organization profile cache,
//! and the typed REST client every screen talks through. Rendering is left to
//! whatever front end embeds it; the `cli/` crate is one such front end.

pub mod config;
pub mod net;
pub mod state;
pub mod storage;
pub mod util;

pub use config::ClientConfig;
pub use net::client::ApiClient;
pub use net::error::ApiError;
pub use state::auth::AuthSession;
pub use state::session::AuthStatus;
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use util::route_guard::{GuardDecision, MemoryNavigator, Navigator, RouteGuard};
