//! # Stream Gate Library
//!
//! This crate provides the viewing-session subsystem for ticketed live
//! events:
//! - RESTful HTTP API for access checks and session admission
//! - WebSocket gateway for playback synchronization and viewer counts
//! - PostgreSQL for events, tickets, and session bookkeeping
//! - Redis for active viewer sets and the authoritative playback position
//! - An embeddable viewing-session controller for player front ends
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core entities and repository traits
//! - **Application Layer**: Admission and entitlement services and DTOs
//! - **Infrastructure Layer**: Database, cache, and metrics implementations
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//! - **Client**: the session controller state machine consumed by players
//!
//! ## Module Structure
//!
//! ```text
//! stream_gate/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database, cache, and metrics implementations
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- client/         Viewing-session controller (protocol consumer)
//! +-- shared/         Common utilities (errors, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Admission and entitlement services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Client-side viewing-session controller
pub mod client;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
