//! Live Event entity and repository trait.
//!
//! A live event is a scheduled, ticketed single-stream screening. Its
//! status drives the client state machine: upcoming events are polled
//! with a countdown, live events admit viewers, ended events deny access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Lifecycle status of a live event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Live,
    Ended,
}

impl EventStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "live" => Self::Live,
            "ended" => Self::Ended,
            _ => Self::Upcoming,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Live => "live",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled, ticketed live screening.
///
/// Maps to the `live_events` table:
/// - id: BIGINT PRIMARY KEY
/// - title: VARCHAR(255) NOT NULL
/// - creator_id: BIGINT NOT NULL
/// - status: VARCHAR(20) NOT NULL DEFAULT 'upcoming'
/// - streaming_at: TIMESTAMPTZ NOT NULL
/// - allowed_seconds: BIGINT NOT NULL DEFAULT 3600
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEvent {
    pub id: i64,

    pub title: String,

    /// User who owns the stream; bypasses the ticket check
    pub creator_id: i64,

    pub status: EventStatus,

    /// Scheduled start of the stream
    pub streaming_at: DateTime<Utc>,

    /// Standard-tier watch budget for this event, in seconds
    pub allowed_seconds: i64,

    pub created_at: DateTime<Utc>,
}

impl LiveEvent {
    /// Whether viewers can currently be admitted.
    pub fn is_live(&self) -> bool {
        self.status == EventStatus::Live
    }

    /// Whether the scheduled start has passed without the stream going live.
    ///
    /// Used by clients to move from the countdown view to an expired view.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == EventStatus::Upcoming && self.streaming_at < now
    }

    /// Seconds until the scheduled start (zero if already due).
    pub fn seconds_until_start(&self, now: DateTime<Utc>) -> i64 {
        (self.streaming_at - now).num_seconds().max(0)
    }
}

/// Repository trait for live event data access.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Find an event by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<LiveEvent>, AppError>;

    /// Find upcoming events whose scheduled start is already past.
    async fn find_overdue_upcoming(&self, now: DateTime<Utc>)
        -> Result<Vec<LiveEvent>, AppError>;

    /// Update the lifecycle status of an event.
    async fn set_status(&self, id: i64, status: EventStatus) -> Result<(), AppError>;
}
