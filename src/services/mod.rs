//! Domain services used by the route layer.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the identity/profile plumbing so route handlers stay
//! focused on protocol translation: `identity` talks to the hosted auth
//! backend, `profile` owns role rows, `context` derives the reactive auth
//! state both of them feed.

pub mod context;
pub mod identity;
pub mod profile;
