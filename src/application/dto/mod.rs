//! Data Transfer Objects
//!
//! Wire-format request and response types for the HTTP API. Field names
//! are camelCase to match the player front ends.

pub mod request;
pub mod response;

pub use request::{InviteRequest, SessionAction, SessionActionRequest};
pub use response::{
    CheckAccessResponse, EventInfo, InviteResponse, SessionStateResponse, TicketInfo,
};
