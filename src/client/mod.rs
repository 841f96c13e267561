//! Viewing-Session Controller
//!
//! The client half of the protocol: an embeddable controller that a player
//! front end drives. It owns the admission lifecycle (access check, start,
//! heartbeat cadence, teardown), reconciles playback position against the
//! authoritative feed, and surfaces a single state machine the player
//! renders from.
//!
//! The controller is transport-agnostic: it talks to the service through
//! the [`SessionApi`] trait, so hosts plug in whatever HTTP stack they
//! already ship.

pub mod api;
pub mod controller;
pub mod device;
pub mod sync;

pub use api::{ApiError, SessionApi};
pub use controller::{SessionController, WatchState};
pub use device::{DeviceIdentity, GeneratedDeviceIdentity, ViewerContext};
pub use sync::{reconcile, SyncUpdate};
