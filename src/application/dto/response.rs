//! Response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{EventStatus, LiveEvent, Ticket};

/// Event details surfaced to the player (countdown, status polling).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub id: i64,
    pub title: String,
    pub status: EventStatus,
    pub streaming_at: DateTime<Utc>,
}

impl From<&LiveEvent> for EventInfo {
    fn from(event: &LiveEvent) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            status: event.status,
            streaming_at: event.streaming_at,
        }
    }
}

/// Ticket summary surfaced by the access check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketInfo {
    pub id: i64,
    pub tier: String,
    pub purchased_at: DateTime<Utc>,
}

impl From<&Ticket> for TicketInfo {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            tier: ticket.tier.as_str().to_string(),
            purchased_at: ticket.purchased_at,
        }
    }
}

/// Response of `GET /api/live-stream/{id}/check-access`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAccessResponse {
    pub has_access: bool,

    pub is_creator: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<TicketInfo>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_viewers: Option<Vec<Uuid>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_viewers: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_position: Option<f64>,
}

/// Response of `POST /api/live-stream/session` for all three actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateResponse {
    pub session_active: bool,

    /// Seconds left in the watch budget; None means unlimited (premium)
    pub time_remaining: Option<i64>,

    pub total_view_time: i64,

    /// Allowed seconds; None means unlimited (premium)
    pub max_time: Option<i64>,

    pub device_count: i64,

    pub is_premium: bool,

    /// Cadence the client must report at, in milliseconds
    pub heartbeat_interval: u64,

    pub playback_position: f64,

    pub current_viewers: i64,

    pub active_viewers: Vec<Uuid>,
}

/// Response of `POST /api/live-stream/invite`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub code: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}
