//! Device Invite entity and repository trait.
//!
//! Premium viewers may invite an extra device to a live event by email,
//! provided their device count is still under the tier ceiling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// An emailed invitation granting one extra device access to an event.
///
/// Maps to the `device_invites` table:
/// - code: VARCHAR(32) PRIMARY KEY
/// - event_id: BIGINT NOT NULL REFERENCES live_events(id)
/// - inviter_id: BIGINT NOT NULL
/// - email: VARCHAR(255) NOT NULL
/// - expires_at: TIMESTAMPTZ NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInvite {
    pub code: String,

    pub event_id: i64,

    pub inviter_id: i64,

    pub email: String,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl DeviceInvite {
    /// Create a new invite expiring after `ttl_secs`.
    pub fn new(event_id: i64, inviter_id: i64, email: String, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            code: Self::generate_code(),
            event_id,
            inviter_id,
            email,
            expires_at: now + chrono::Duration::seconds(ttl_secs),
            created_at: now,
        }
    }

    /// Generate a random invite code.
    pub fn generate_code() -> String {
        use rand::Rng;
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const CODE_LEN: usize = 12;

        let mut rng = rand::rng();
        (0..CODE_LEN)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Repository trait for device invite data access.
#[async_trait]
pub trait DeviceInviteRepository: Send + Sync {
    /// Persist a new invite.
    async fn create(&self, invite: &DeviceInvite) -> Result<DeviceInvite, AppError>;

    /// Find an invite by its code.
    async fn find_by_code(&self, code: &str) -> Result<Option<DeviceInvite>, AppError>;

    /// Delete expired invites (maintenance task). Returns rows removed.
    async fn delete_expired(&self) -> Result<i64, AppError>;
}
