//! Repository Implementations
//!
//! PostgreSQL-backed implementations of the domain repository traits.

pub mod event_repository;
pub mod invite_repository;
pub mod session_repository;
pub mod ticket_repository;

pub use event_repository::PgEventRepository;
pub use invite_repository::PgDeviceInviteRepository;
pub use session_repository::PgViewSessionRepository;
pub use ticket_repository::PgTicketRepository;
