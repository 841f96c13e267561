//! Access Service
//!
//! Answers the watch-page gate question: may this user see the player for
//! this event at all? Admission proper (device ceilings, watch budget) is
//! the session service's job; this check only covers ownership and tickets.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    EventRepository, LiveEvent, PlaybackPosition, Ticket, TicketRepository, ViewerRegistry,
};
use crate::shared::error::AppError;

/// Access service trait.
#[async_trait]
pub trait AccessService: Send + Sync {
    /// Check whether a user may view an event's watch page.
    async fn check_access(&self, event_id: i64, user_id: i64)
        -> Result<AccessDecision, AppError>;
}

/// Why the gate denied access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    NoTicket,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NoTicket => "NO_TICKET",
        }
    }
}

/// Outcome of the watch-page gate.
#[derive(Debug, Clone)]
pub struct AccessDecision {
    pub has_access: bool,
    pub is_creator: bool,
    pub reason: Option<DenialReason>,
    pub event: LiveEvent,
    pub tickets: Vec<Ticket>,
    pub current_viewers: i64,
    pub active_viewers: Vec<Uuid>,
    pub playback_position: Option<PlaybackPosition>,
}

/// Access service implementation.
pub struct AccessServiceImpl<E, T, V>
where
    E: EventRepository,
    T: TicketRepository,
    V: ViewerRegistry,
{
    events: Arc<E>,
    tickets: Arc<T>,
    viewers: Arc<V>,
}

impl<E, T, V> AccessServiceImpl<E, T, V>
where
    E: EventRepository,
    T: TicketRepository,
    V: ViewerRegistry,
{
    /// Create a new AccessServiceImpl.
    pub fn new(events: Arc<E>, tickets: Arc<T>, viewers: Arc<V>) -> Self {
        Self {
            events,
            tickets,
            viewers,
        }
    }
}

#[async_trait]
impl<E, T, V> AccessService for AccessServiceImpl<E, T, V>
where
    E: EventRepository + 'static,
    T: TicketRepository + 'static,
    V: ViewerRegistry + 'static,
{
    async fn check_access(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<AccessDecision, AppError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let is_creator = event.creator_id == user_id;

        let tickets = self.tickets.find_for_user_event(user_id, event_id).await?;

        if !is_creator && tickets.is_empty() {
            tracing::debug!(event_id, user_id, "Watch page access denied");
            return Ok(AccessDecision {
                has_access: false,
                is_creator: false,
                reason: Some(DenialReason::NoTicket),
                event,
                tickets,
                current_viewers: 0,
                active_viewers: Vec::new(),
                playback_position: None,
            });
        }

        let current_viewers = self.viewers.viewer_count(event_id).await?;
        let active_viewers = self.viewers.active_viewers(event_id).await?;
        let playback_position = self.viewers.playback_position(event_id).await?;

        Ok(AccessDecision {
            has_access: true,
            is_creator,
            reason: None,
            event,
            tickets,
            current_viewers,
            active_viewers,
            playback_position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::EntitlementTier;
    use crate::domain::EventStatus;
    use chrono::{DateTime, Utc};
    use mockall::mock;

    mock! {
        Events {}
        #[async_trait]
        impl EventRepository for Events {
            async fn find_by_id(&self, id: i64) -> Result<Option<LiveEvent>, AppError>;
            async fn find_overdue_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<LiveEvent>, AppError>;
            async fn set_status(&self, id: i64, status: EventStatus) -> Result<(), AppError>;
        }
    }

    mock! {
        Tickets {}
        #[async_trait]
        impl TicketRepository for Tickets {
            async fn find_for_user_event(
                &self,
                user_id: i64,
                event_id: i64,
            ) -> Result<Vec<Ticket>, AppError>;
        }
    }

    mock! {
        Viewers {}
        #[async_trait]
        impl ViewerRegistry for Viewers {
            async fn join(&self, event_id: i64, device_id: Uuid) -> Result<i64, AppError>;
            async fn leave(&self, event_id: i64, device_id: Uuid) -> Result<i64, AppError>;
            async fn touch(&self, event_id: i64, device_id: Uuid) -> Result<(), AppError>;
            async fn active_viewers(&self, event_id: i64) -> Result<Vec<Uuid>, AppError>;
            async fn viewer_count(&self, event_id: i64) -> Result<i64, AppError>;
            async fn playback_position(
                &self,
                event_id: i64,
            ) -> Result<Option<PlaybackPosition>, AppError>;
            async fn set_playback_position(
                &self,
                event_id: i64,
                position: PlaybackPosition,
            ) -> Result<(), AppError>;
        }
    }

    fn event(creator_id: i64) -> LiveEvent {
        LiveEvent {
            id: 1,
            title: "Premiere".into(),
            creator_id,
            status: EventStatus::Live,
            streaming_at: Utc::now(),
            allowed_seconds: 3600,
            created_at: Utc::now(),
        }
    }

    fn ticket() -> Ticket {
        Ticket {
            id: 1,
            user_id: 7,
            event_id: 1,
            tier: EntitlementTier::Standard,
            purchased_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ticket_holder_is_granted_access() {
        let mut events = MockEvents::new();
        events.expect_find_by_id().returning(|_| Ok(Some(event(99))));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![ticket()]));

        let mut viewers = MockViewers::new();
        viewers.expect_viewer_count().returning(|_| Ok(3));
        viewers
            .expect_active_viewers()
            .returning(|_| Ok(vec![Uuid::new_v4()]));
        viewers
            .expect_playback_position()
            .returning(|_| Ok(Some(12.5.into())));

        let svc = AccessServiceImpl::new(Arc::new(events), Arc::new(tickets), Arc::new(viewers));
        let decision = svc.check_access(1, 7).await.unwrap();

        assert!(decision.has_access);
        assert!(!decision.is_creator);
        assert_eq!(decision.current_viewers, 3);
        assert_eq!(decision.playback_position, Some(12.5.into()));
    }

    #[tokio::test]
    async fn creator_is_granted_access_without_tickets() {
        let mut events = MockEvents::new();
        events.expect_find_by_id().returning(|_| Ok(Some(event(7))));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![]));

        let mut viewers = MockViewers::new();
        viewers.expect_viewer_count().returning(|_| Ok(0));
        viewers.expect_active_viewers().returning(|_| Ok(vec![]));
        viewers.expect_playback_position().returning(|_| Ok(None));

        let svc = AccessServiceImpl::new(Arc::new(events), Arc::new(tickets), Arc::new(viewers));
        let decision = svc.check_access(1, 7).await.unwrap();

        assert!(decision.has_access);
        assert!(decision.is_creator);
    }

    #[tokio::test]
    async fn ticketless_user_is_denied_with_reason() {
        let mut events = MockEvents::new();
        events.expect_find_by_id().returning(|_| Ok(Some(event(99))));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![]));

        let mut viewers = MockViewers::new();
        viewers.expect_viewer_count().never();

        let svc = AccessServiceImpl::new(Arc::new(events), Arc::new(tickets), Arc::new(viewers));
        let decision = svc.check_access(1, 7).await.unwrap();

        assert!(!decision.has_access);
        assert_eq!(decision.reason, Some(DenialReason::NoTicket));
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let mut events = MockEvents::new();
        events.expect_find_by_id().returning(|_| Ok(None));

        let tickets = MockTickets::new();
        let viewers = MockViewers::new();

        let svc = AccessServiceImpl::new(Arc::new(events), Arc::new(tickets), Arc::new(viewers));
        let err = svc.check_access(1, 7).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
