//! Device Identity and Viewer Context
//!
//! Who is watching, and on which device. Both are injected into the
//! controller rather than read from ambient state, so hosts and tests
//! control them fully.

use uuid::Uuid;

/// The viewer on whose behalf the controller acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerContext {
    pub user_id: i64,
}

impl ViewerContext {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Source of the stable per-device identifier.
///
/// The id must stay stable for the lifetime of the controller; the server
/// counts concurrent devices by it.
pub trait DeviceIdentity: Send + Sync {
    fn device_id(&self) -> Uuid;
}

/// Default identity: a UUID v4 generated once at construction.
#[derive(Debug, Clone, Copy)]
pub struct GeneratedDeviceIdentity {
    id: Uuid,
}

impl GeneratedDeviceIdentity {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for GeneratedDeviceIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceIdentity for GeneratedDeviceIdentity {
    fn device_id(&self) -> Uuid {
        self.id
    }
}

/// Fixed identity for tests and session restoration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDeviceIdentity(pub Uuid);

impl DeviceIdentity for FixedDeviceIdentity {
    fn device_id(&self) -> Uuid {
        self.0
    }
}
