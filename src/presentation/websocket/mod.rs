//! WebSocket Module
//!
//! Live audience sync: viewer counts, roster updates, and playback
//! position fan-out per event.

pub mod gateway;
pub mod handler;
pub mod messages;

pub use gateway::EventGateway;
pub use handler::ws_handler;
pub use messages::{ClientMessage, ServerMessage};
