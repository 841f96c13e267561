//! Ticket Repository Implementation
//!
//! PostgreSQL implementation of the TicketRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::value_objects::EntitlementTier;
use crate::domain::{Ticket, TicketRepository};
use crate::shared::error::AppError;

/// Database row representation matching the tickets table schema.
#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    user_id: i64,
    event_id: i64,
    tier: String,
    purchased_at: DateTime<Utc>,
}

impl TicketRow {
    fn into_ticket(self) -> Ticket {
        Ticket {
            id: self.id,
            user_id: self.user_id,
            event_id: self.event_id,
            tier: EntitlementTier::from_str(&self.tier),
            purchased_at: self.purchased_at,
        }
    }
}

/// PostgreSQL ticket repository implementation.
#[derive(Clone)]
pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    /// Create a new PgTicketRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn find_for_user_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, user_id, event_id, tier, purchased_at
            FROM tickets
            WHERE user_id = $1 AND event_id = $2
            ORDER BY purchased_at DESC
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_ticket()).collect())
    }
}
