//! Front-end helpers that sit above the state stores.
//!
//! SYSTEM CONTEXT
//! ==============
//! `route_guard` gates protected views on the session verdict, `nav` builds
//! the role-dependent menu, and `phone` handles phone-number input.

pub mod nav;
pub mod phone;
pub mod route_guard;
