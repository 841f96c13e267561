//! Active viewer set and playback position contract.
//!
//! The set of devices currently counted as watching an event, plus the
//! authoritative playback position. Membership changes only via explicit
//! join/leave or heartbeat timeout; implementations prune entries whose
//! last heartbeat is older than the configured TTL.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::value_objects::PlaybackPosition;
use crate::shared::error::AppError;

/// Coordination state for one event's live audience.
#[async_trait]
pub trait ViewerRegistry: Send + Sync {
    /// Add a device to the event's viewer set. Returns the new count.
    async fn join(&self, event_id: i64, device_id: Uuid) -> Result<i64, AppError>;

    /// Remove a device from the event's viewer set. Returns the new count.
    async fn leave(&self, event_id: i64, device_id: Uuid) -> Result<i64, AppError>;

    /// Refresh a device's liveness stamp (heartbeat).
    async fn touch(&self, event_id: i64, device_id: Uuid) -> Result<(), AppError>;

    /// Devices currently counted as watching, pruned of stale entries.
    async fn active_viewers(&self, event_id: i64) -> Result<Vec<Uuid>, AppError>;

    /// Current viewer count, pruned of stale entries.
    async fn viewer_count(&self, event_id: i64) -> Result<i64, AppError>;

    /// Last known authoritative playback position for the event.
    async fn playback_position(&self, event_id: i64) -> Result<Option<PlaybackPosition>, AppError>;

    /// Advance the authoritative playback position.
    async fn set_playback_position(
        &self,
        event_id: i64,
        position: PlaybackPosition,
    ) -> Result<(), AppError>;
}
