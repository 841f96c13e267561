//! Value Objects
//!
//! Immutable value types shared across the domain.

pub mod playback;
pub mod tier;

pub use playback::PlaybackPosition;
pub use tier::EntitlementTier;
