//! Request Handlers
//!
//! HTTP handlers for the viewing-session API.

pub mod access;
pub mod health;
pub mod invite;
pub mod session;
