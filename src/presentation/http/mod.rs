//! HTTP Module
//!
//! Route configuration, request handlers, and custom extractors.

pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::Identity;
