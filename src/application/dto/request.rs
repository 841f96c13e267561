//! Request DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Action requested against the session endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
    Start,
    Heartbeat,
    End,
}

/// Body of `POST /api/live-stream/session`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionActionRequest {
    pub event_id: i64,

    pub action: SessionAction,

    /// Stable per-device identifier (UUID v4, client-generated)
    pub device_id: Uuid,

    /// Local playback position in seconds, reported on heartbeats
    pub current_time: Option<f64>,

    /// Total watch duration in seconds, reported on end
    pub duration: Option<i64>,
}

/// Body of `POST /api/live-stream/invite`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub event_id: i64,

    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}
