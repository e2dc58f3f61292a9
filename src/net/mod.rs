//! Networking modules for the ProfMed REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` owns the HTTP layer and its auth policy, `auth_api` and
//! `resources` wrap individual endpoints, `scope` bounds request lifetimes,
//! `error` is the failure taxonomy, and `types` defines the wire schema.

pub mod auth_api;
pub mod client;
pub mod error;
pub mod resources;
pub mod scope;
pub mod types;
