//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AccessService**: ticket/ownership checks for the watch page
//! - **SessionService**: admission, heartbeat time accounting, teardown
//! - **InviteService**: premium extra-device invitations

pub mod access_service;
pub mod invite_service;
pub mod session_service;

// Re-export access service types
pub use access_service::{AccessDecision, AccessService, AccessServiceImpl, DenialReason};

// Re-export session service types
pub use session_service::{
    SessionError, SessionService, SessionServiceImpl, SessionSnapshot,
};

// Re-export invite service types
pub use invite_service::{InviteError, InviteService, InviteServiceImpl};
