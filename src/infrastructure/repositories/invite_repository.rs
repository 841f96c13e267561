//! Device Invite Repository Implementation
//!
//! PostgreSQL implementation of the DeviceInviteRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{DeviceInvite, DeviceInviteRepository};
use crate::shared::error::AppError;

/// Database row representation matching the device_invites table schema.
#[derive(Debug, sqlx::FromRow)]
struct DeviceInviteRow {
    code: String,
    event_id: i64,
    inviter_id: i64,
    email: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl DeviceInviteRow {
    fn into_invite(self) -> DeviceInvite {
        DeviceInvite {
            code: self.code,
            event_id: self.event_id,
            inviter_id: self.inviter_id,
            email: self.email,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL device invite repository implementation.
#[derive(Clone)]
pub struct PgDeviceInviteRepository {
    pool: PgPool,
}

impl PgDeviceInviteRepository {
    /// Create a new PgDeviceInviteRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceInviteRepository for PgDeviceInviteRepository {
    async fn create(&self, invite: &DeviceInvite) -> Result<DeviceInvite, AppError> {
        let row = sqlx::query_as::<_, DeviceInviteRow>(
            r#"
            INSERT INTO device_invites (code, event_id, inviter_id, email, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING code, event_id, inviter_id, email, expires_at, created_at
            "#,
        )
        .bind(&invite.code)
        .bind(invite.event_id)
        .bind(invite.inviter_id)
        .bind(&invite.email)
        .bind(invite.expires_at)
        .bind(invite.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_invite())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<DeviceInvite>, AppError> {
        let row = sqlx::query_as::<_, DeviceInviteRow>(
            r#"
            SELECT code, event_id, inviter_id, email, expires_at, created_at
            FROM device_invites
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_invite()))
    }

    async fn delete_expired(&self) -> Result<i64, AppError> {
        let result = sqlx::query("DELETE FROM device_invites WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as i64)
    }
}
