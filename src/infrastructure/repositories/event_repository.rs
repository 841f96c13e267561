//! Event Repository Implementation
//!
//! PostgreSQL implementation of the EventRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{EventRepository, EventStatus, LiveEvent};
use crate::shared::error::AppError;

/// Database row representation matching the live_events table schema.
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    title: String,
    creator_id: i64,
    status: String,
    streaming_at: DateTime<Utc>,
    allowed_seconds: i64,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> LiveEvent {
        LiveEvent {
            id: self.id,
            title: self.title,
            creator_id: self.creator_id,
            status: EventStatus::from_str(&self.status),
            streaming_at: self.streaming_at,
            allowed_seconds: self.allowed_seconds,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL event repository implementation.
#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Create a new PgEventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<LiveEvent>, AppError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, creator_id, status, streaming_at, allowed_seconds, created_at
            FROM live_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_event()))
    }

    async fn find_overdue_upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<LiveEvent>, AppError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, creator_id, status, streaming_at, allowed_seconds, created_at
            FROM live_events
            WHERE status = 'upcoming' AND streaming_at < $1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_event()).collect())
    }

    async fn set_status(&self, id: i64, status: EventStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE live_events SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
