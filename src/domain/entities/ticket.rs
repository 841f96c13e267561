//! Ticket entity and repository trait.
//!
//! Possession of a ticket grants access to one live event. The ticket's
//! entitlement tier decides time budgets and the concurrent-device ceiling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EntitlementTier;
use crate::shared::error::AppError;

/// A purchased admission to a live event.
///
/// Maps to the `tickets` table:
/// - id: BIGINT PRIMARY KEY
/// - user_id: BIGINT NOT NULL
/// - event_id: BIGINT NOT NULL REFERENCES live_events(id)
/// - tier: VARCHAR(20) NOT NULL DEFAULT 'standard'
/// - purchased_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,

    pub user_id: i64,

    pub event_id: i64,

    /// Entitlement tier purchased with this ticket
    pub tier: EntitlementTier,

    pub purchased_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_premium(&self) -> bool {
        self.tier == EntitlementTier::Premium
    }
}

/// Repository trait for ticket data access.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Find all tickets a user holds for an event.
    async fn find_for_user_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<Vec<Ticket>, AppError>;
}
