//! Domain Services
//!
//! Contracts for coordination state that lives outside the database.

pub mod viewer_registry;

pub use viewer_registry::ViewerRegistry;
