//! View Session Repository Implementation
//!
//! PostgreSQL implementation of the ViewSessionRepository trait. Watch time
//! is accrued server-side on heartbeats; the sum across a user's sessions
//! for an event is the budget the admission rules enforce.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{ViewSession, ViewSessionRepository};
use crate::shared::error::AppError;

/// Database row representation matching the view_sessions table schema.
#[derive(Debug, sqlx::FromRow)]
struct ViewSessionRow {
    id: Uuid,
    event_id: i64,
    user_id: i64,
    device_id: Uuid,
    active: bool,
    view_seconds: i64,
    started_at: DateTime<Utc>,
    last_heartbeat_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl ViewSessionRow {
    fn into_session(self) -> ViewSession {
        ViewSession {
            id: self.id,
            event_id: self.event_id,
            user_id: self.user_id,
            device_id: self.device_id,
            active: self.active,
            view_seconds: self.view_seconds,
            started_at: self.started_at,
            last_heartbeat_at: self.last_heartbeat_at,
            ended_at: self.ended_at,
        }
    }
}

/// PostgreSQL view session repository implementation.
#[derive(Clone)]
pub struct PgViewSessionRepository {
    pool: PgPool,
}

impl PgViewSessionRepository {
    /// Create a new PgViewSessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ViewSessionRepository for PgViewSessionRepository {
    async fn find_active(
        &self,
        event_id: i64,
        user_id: i64,
        device_id: Uuid,
    ) -> Result<Option<ViewSession>, AppError> {
        let row = sqlx::query_as::<_, ViewSessionRow>(
            r#"
            SELECT id, event_id, user_id, device_id, active, view_seconds,
                   started_at, last_heartbeat_at, ended_at
            FROM view_sessions
            WHERE event_id = $1 AND user_id = $2 AND device_id = $3 AND active = TRUE
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn create(&self, session: &ViewSession) -> Result<ViewSession, AppError> {
        let row = sqlx::query_as::<_, ViewSessionRow>(
            r#"
            INSERT INTO view_sessions (
                id, event_id, user_id, device_id, active, view_seconds,
                started_at, last_heartbeat_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, event_id, user_id, device_id, active, view_seconds,
                      started_at, last_heartbeat_at, ended_at
            "#,
        )
        .bind(session.id)
        .bind(session.event_id)
        .bind(session.user_id)
        .bind(session.device_id)
        .bind(session.active)
        .bind(session.view_seconds)
        .bind(session.started_at)
        .bind(session.last_heartbeat_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_session())
    }

    async fn record_heartbeat(&self, id: Uuid, accrued_seconds: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE view_sessions
            SET view_seconds = view_seconds + $2, last_heartbeat_at = NOW()
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .bind(accrued_seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE view_sessions
            SET active = FALSE, ended_at = NOW()
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_active_devices(&self, event_id: i64, user_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT device_id)
            FROM view_sessions
            WHERE event_id = $1 AND user_id = $2 AND active = TRUE
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn total_view_seconds(&self, event_id: i64, user_id: i64) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(view_seconds), 0)::BIGINT
            FROM view_sessions
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn deactivate_stale(&self, ttl_secs: i64) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE view_sessions
            SET active = FALSE, ended_at = NOW()
            WHERE active = TRUE
              AND last_heartbeat_at < NOW() - make_interval(secs => $1)
            "#,
        )
        .bind(ttl_secs as f64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as i64)
    }
}
