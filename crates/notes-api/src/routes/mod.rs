//! # API Route Modules
//!
//! - `notes`: owner-scoped note CRUD, behind bearer authentication.
//! - `auth`: token obtain, refresh, and verify. Unauthenticated.

pub mod auth;
pub mod notes;
