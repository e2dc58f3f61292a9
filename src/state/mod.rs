//! Client-side session state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` holds the bearer tokens and hydration flag, `profile` caches the
//! role/organization projection, and `auth` coordinates the two so login and
//! logout always move them together.

pub mod auth;
pub mod profile;
pub mod session;
