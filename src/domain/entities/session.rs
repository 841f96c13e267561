//! View Session entity and repository trait.
//!
//! One row per device admission to a live event. A session is active only
//! between a successful start and an explicit end, a heartbeat timeout, or
//! time-budget exhaustion. Watch time accrues on the session row and is
//! aggregated per user+event when enforcing the budget.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// One device's admission to watch a live event.
///
/// Maps to the `view_sessions` table:
/// - id: UUID PRIMARY KEY DEFAULT gen_random_uuid()
/// - event_id: BIGINT NOT NULL REFERENCES live_events(id)
/// - user_id: BIGINT NOT NULL
/// - device_id: UUID NOT NULL (client-generated, stable per device)
/// - active: BOOLEAN NOT NULL DEFAULT TRUE
/// - view_seconds: BIGINT NOT NULL DEFAULT 0
/// - started_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - last_heartbeat_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - ended_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSession {
    pub id: Uuid,

    pub event_id: i64,

    pub user_id: i64,

    /// Stable per-device identifier, generated client-side (UUID v4)
    pub device_id: Uuid,

    pub active: bool,

    /// Watch seconds accrued by this session
    pub view_seconds: i64,

    pub started_at: DateTime<Utc>,

    pub last_heartbeat_at: DateTime<Utc>,

    pub ended_at: Option<DateTime<Utc>>,
}

impl ViewSession {
    /// Create a fresh session for a device joining an event.
    pub fn new(event_id: i64, user_id: i64, device_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            device_id,
            active: true,
            view_seconds: 0,
            started_at: now,
            last_heartbeat_at: now,
            ended_at: None,
        }
    }

    /// Seconds a heartbeat may legitimately accrue.
    ///
    /// The client reports at a fixed cadence, but the claim is capped at the
    /// wall-clock delta since the last report so a misbehaving client cannot
    /// burn the budget faster than real time.
    pub fn accruable_seconds(&self, now: DateTime<Utc>, claimed: i64) -> i64 {
        let elapsed = (now - self.last_heartbeat_at).num_seconds().max(0);
        claimed.clamp(0, elapsed)
    }

    /// Whether the last heartbeat is older than the liveness TTL.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl_secs: i64) -> bool {
        (now - self.last_heartbeat_at).num_seconds() > ttl_secs
    }
}

/// Repository trait for view session data access.
#[async_trait]
pub trait ViewSessionRepository: Send + Sync {
    /// Find the active session for a device on an event, if any.
    async fn find_active(
        &self,
        event_id: i64,
        user_id: i64,
        device_id: Uuid,
    ) -> Result<Option<ViewSession>, AppError>;

    /// Persist a new session.
    async fn create(&self, session: &ViewSession) -> Result<ViewSession, AppError>;

    /// Record a heartbeat: refresh liveness and accrue watch seconds.
    async fn record_heartbeat(&self, id: Uuid, accrued_seconds: i64) -> Result<(), AppError>;

    /// Mark a session inactive and stamp its end time.
    async fn deactivate(&self, id: Uuid) -> Result<(), AppError>;

    /// Count distinct active devices for a user on an event.
    async fn count_active_devices(&self, event_id: i64, user_id: i64) -> Result<i64, AppError>;

    /// Total watch seconds a user has consumed on an event, across sessions.
    async fn total_view_seconds(&self, event_id: i64, user_id: i64) -> Result<i64, AppError>;

    /// Deactivate sessions whose last heartbeat is older than the TTL.
    /// Returns the number of sessions reaped.
    async fn deactivate_stale(&self, ttl_secs: i64) -> Result<i64, AppError>;
}
