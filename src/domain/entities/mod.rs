//! Domain Entities
//!
//! Core entities of the viewing-session subsystem and their repository
//! traits.

pub mod event;
pub mod invite;
pub mod session;
pub mod ticket;

pub use event::{EventRepository, EventStatus, LiveEvent};
pub use invite::{DeviceInvite, DeviceInviteRepository};
pub use session::{ViewSession, ViewSessionRepository};
pub use ticket::{Ticket, TicketRepository};
