//! # Domain Layer
//!
//! The domain layer contains the core business rules of the viewing-session
//! subsystem. It is independent of any external frameworks or infrastructure
//! concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (LiveEvent, Ticket, ViewSession, DeviceInvite)
//! - **value_objects**: Immutable value types (EntitlementTier, PlaybackPosition)
//! - **services**: Domain service contracts (ViewerRegistry)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities encapsulate admission and time-accounting rules

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::ViewerRegistry;
pub use value_objects::*;
