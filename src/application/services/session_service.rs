//! Session Service
//!
//! The authoritative admission path: decides whether a device may start
//! watching, accounts consumed watch time on heartbeats, and tears sessions
//! down. All capacity and entitlement rules live here; handlers only map
//! the outcomes onto HTTP statuses.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::config::SessionPolicySettings;
use crate::domain::{
    EventRepository, PlaybackPosition, TicketRepository, ViewSession, ViewSessionRepository,
    ViewerRegistry,
};

/// Session service trait defining the admission operations.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Admit a device to a live event, or reject with a terminal reason.
    async fn start(
        &self,
        event_id: i64,
        user_id: i64,
        device_id: Uuid,
    ) -> Result<SessionSnapshot, SessionError>;

    /// Record a heartbeat: refresh liveness, accrue watch time, persist the
    /// reported playback position, and return updated entitlement state.
    async fn heartbeat(
        &self,
        event_id: i64,
        user_id: i64,
        device_id: Uuid,
        current_time: Option<f64>,
    ) -> Result<SessionSnapshot, SessionError>;

    /// Best-effort teardown on navigation away or unmount.
    async fn end(
        &self,
        event_id: i64,
        user_id: i64,
        device_id: Uuid,
        duration: Option<i64>,
    ) -> Result<(), SessionError>;
}

/// Entitlement state returned to the client after each action.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_active: bool,
    /// Seconds left in the budget; None means unlimited (premium)
    pub time_remaining: Option<i64>,
    pub total_view_time: i64,
    /// Allowed seconds; None means unlimited (premium)
    pub max_time: Option<i64>,
    pub device_count: i64,
    pub is_premium: bool,
    pub heartbeat_interval_ms: u64,
    pub playback_position: PlaybackPosition,
    pub current_viewers: i64,
    pub active_viewers: Vec<Uuid>,
}

/// Session service errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Event not found")]
    EventNotFound,

    #[error("Event is not live")]
    NotLive,

    #[error("No ticket for this event")]
    NoTicket,

    /// Terminal: the user's watch budget is spent.
    #[error("Time limit reached: {used} of {allowed} allowed seconds used")]
    TimeLimitReached { used: i64, allowed: i64 },

    /// Terminal: admitting this device would exceed the tier ceiling.
    #[error("Maximum concurrent viewers reached ({max_devices} devices)")]
    MaxViewersReached { max_devices: i64 },

    #[error("No active session for this device")]
    SessionNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Session service implementation.
pub struct SessionServiceImpl<E, T, S, V>
where
    E: EventRepository,
    T: TicketRepository,
    S: ViewSessionRepository,
    V: ViewerRegistry,
{
    events: Arc<E>,
    tickets: Arc<T>,
    sessions: Arc<S>,
    viewers: Arc<V>,
    policy: SessionPolicySettings,
}

impl<E, T, S, V> SessionServiceImpl<E, T, S, V>
where
    E: EventRepository,
    T: TicketRepository,
    S: ViewSessionRepository,
    V: ViewerRegistry,
{
    /// Create a new SessionServiceImpl.
    pub fn new(
        events: Arc<E>,
        tickets: Arc<T>,
        sessions: Arc<S>,
        viewers: Arc<V>,
        policy: SessionPolicySettings,
    ) -> Self {
        Self {
            events,
            tickets,
            sessions,
            viewers,
            policy,
        }
    }

    /// Resolve the viewer's entitlement for an event.
    ///
    /// Creators bypass the ticket check and are treated as premium.
    async fn entitlement(
        &self,
        event_id: i64,
        user_id: i64,
        creator_id: i64,
    ) -> Result<bool, SessionError> {
        if user_id == creator_id {
            return Ok(true);
        }

        let tickets = self
            .tickets
            .find_for_user_event(user_id, event_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        if tickets.is_empty() {
            return Err(SessionError::NoTicket);
        }

        Ok(tickets.iter().any(|t| t.is_premium()))
    }

    /// Assemble the entitlement snapshot returned after each action.
    async fn snapshot(
        &self,
        event_id: i64,
        user_id: i64,
        session_active: bool,
        total_view_time: i64,
        max_time: Option<i64>,
        is_premium: bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let device_count = self
            .sessions
            .count_active_devices(event_id, user_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        let current_viewers = self
            .viewers
            .viewer_count(event_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        let active_viewers = self
            .viewers
            .active_viewers(event_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        let playback_position = self
            .viewers
            .playback_position(event_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?
            .unwrap_or_default();

        Ok(SessionSnapshot {
            session_active,
            time_remaining: max_time.map(|allowed| (allowed - total_view_time).max(0)),
            total_view_time,
            max_time,
            device_count,
            is_premium,
            heartbeat_interval_ms: self.policy.heartbeat_interval_ms,
            playback_position,
            current_viewers,
            active_viewers,
        })
    }
}

#[async_trait]
impl<E, T, S, V> SessionService for SessionServiceImpl<E, T, S, V>
where
    E: EventRepository + 'static,
    T: TicketRepository + 'static,
    S: ViewSessionRepository + 'static,
    V: ViewerRegistry + 'static,
{
    async fn start(
        &self,
        event_id: i64,
        user_id: i64,
        device_id: Uuid,
    ) -> Result<SessionSnapshot, SessionError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?
            .ok_or(SessionError::EventNotFound)?;

        if !event.is_live() {
            return Err(SessionError::NotLive);
        }

        let is_premium = self.entitlement(event_id, user_id, event.creator_id).await?;

        let total = self
            .sessions
            .total_view_seconds(event_id, user_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        let max_time = if is_premium {
            None
        } else {
            Some(event.allowed_seconds)
        };

        if let Some(allowed) = max_time {
            if total >= allowed {
                return Err(SessionError::TimeLimitReached {
                    used: total,
                    allowed,
                });
            }
        }

        // Re-admitting an already-active device is idempotent; only a new
        // device counts against the tier ceiling
        let existing = self
            .sessions
            .find_active(event_id, user_id, device_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        let session = match existing {
            Some(session) => session,
            None => {
                let devices = self
                    .sessions
                    .count_active_devices(event_id, user_id)
                    .await
                    .map_err(|e| SessionError::Internal(e.to_string()))?;

                let max_devices = self.policy.max_devices(is_premium);
                if devices >= max_devices {
                    return Err(SessionError::MaxViewersReached { max_devices });
                }

                self.sessions
                    .create(&ViewSession::new(event_id, user_id, device_id))
                    .await
                    .map_err(|e| SessionError::Internal(e.to_string()))?
            }
        };

        self.viewers
            .join(event_id, device_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        tracing::info!(
            event_id,
            user_id,
            device_id = %device_id,
            session_id = %session.id,
            is_premium,
            "Viewing session started"
        );

        self.snapshot(event_id, user_id, true, total, max_time, is_premium)
            .await
    }

    async fn heartbeat(
        &self,
        event_id: i64,
        user_id: i64,
        device_id: Uuid,
        current_time: Option<f64>,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self
            .sessions
            .find_active(event_id, user_id, device_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?
            .ok_or(SessionError::SessionNotFound)?;

        let event = self
            .events
            .find_by_id(event_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?
            .ok_or(SessionError::EventNotFound)?;

        let is_premium = self.entitlement(event_id, user_id, event.creator_id).await?;

        // The claim is one heartbeat interval, capped at the wall-clock
        // delta since the last report
        let now = Utc::now();
        let claimed = (self.policy.heartbeat_interval_ms / 1000) as i64;
        let accrued = session.accruable_seconds(now, claimed);

        self.sessions
            .record_heartbeat(session.id, accrued)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        self.viewers
            .touch(event_id, device_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        if let Some(position) = current_time {
            self.viewers
                .set_playback_position(event_id, position.into())
                .await
                .map_err(|e| SessionError::Internal(e.to_string()))?;
        }

        let total = self
            .sessions
            .total_view_seconds(event_id, user_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        let max_time = if is_premium {
            None
        } else {
            Some(event.allowed_seconds)
        };

        // Budget crossed zero: the session ends here, and the snapshot tells
        // the client this is terminal rather than a transient failure
        if let Some(allowed) = max_time {
            if total >= allowed {
                self.sessions
                    .deactivate(session.id)
                    .await
                    .map_err(|e| SessionError::Internal(e.to_string()))?;
                self.viewers
                    .leave(event_id, device_id)
                    .await
                    .map_err(|e| SessionError::Internal(e.to_string()))?;

                tracing::info!(
                    event_id,
                    user_id,
                    device_id = %device_id,
                    total,
                    allowed,
                    "Watch budget exhausted, session deactivated"
                );

                return self
                    .snapshot(event_id, user_id, false, total, max_time, is_premium)
                    .await;
            }
        }

        self.snapshot(event_id, user_id, true, total, max_time, is_premium)
            .await
    }

    async fn end(
        &self,
        event_id: i64,
        user_id: i64,
        device_id: Uuid,
        duration: Option<i64>,
    ) -> Result<(), SessionError> {
        let session = self
            .sessions
            .find_active(event_id, user_id, device_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?
            .ok_or(SessionError::SessionNotFound)?;

        self.sessions
            .deactivate(session.id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        self.viewers
            .leave(event_id, device_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        tracing::info!(
            event_id,
            user_id,
            device_id = %device_id,
            session_id = %session.id,
            duration = ?duration,
            "Viewing session ended"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventStatus, LiveEvent, Ticket};
    use crate::domain::value_objects::EntitlementTier;
    use crate::shared::error::AppError;
    use chrono::DateTime;
    use mockall::mock;
    use mockall::predicate::eq;

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
        Sessions {}
        #[async_trait]
        impl ViewSessionRepository for Sessions {
            async fn find_active(
                &self,
                event_id: i64,
                user_id: i64,
                device_id: Uuid,
            ) -> Result<Option<ViewSession>, AppError>;
            async fn create(&self, session: &ViewSession) -> Result<ViewSession, AppError>;
            async fn record_heartbeat(&self, id: Uuid, accrued_seconds: i64) -> Result<(), AppError>;
            async fn deactivate(&self, id: Uuid) -> Result<(), AppError>;
            async fn count_active_devices(&self, event_id: i64, user_id: i64) -> Result<i64, AppError>;
            async fn total_view_seconds(&self, event_id: i64, user_id: i64) -> Result<i64, AppError>;
            async fn deactivate_stale(&self, ttl_secs: i64) -> Result<i64, AppError>;
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

    const EVENT_ID: i64 = 42;
    const USER_ID: i64 = 7;
    const CREATOR_ID: i64 = 1000;

    fn policy() -> SessionPolicySettings {
        SessionPolicySettings {
            heartbeat_interval_ms: 30000,
            viewer_ttl_secs: 75,
            standard_allowed_seconds: 3600,
            standard_max_devices: 1,
            premium_max_devices: 3,
            drift_threshold_secs: 3.0,
            invite_ttl_secs: 86400,
        }
    }

    fn live_event() -> LiveEvent {
        LiveEvent {
            id: EVENT_ID,
            title: "Premiere".into(),
            creator_id: CREATOR_ID,
            status: EventStatus::Live,
            streaming_at: Utc::now(),
            allowed_seconds: 3600,
            created_at: Utc::now(),
        }
    }

    fn standard_ticket() -> Ticket {
        Ticket {
            id: 1,
            user_id: USER_ID,
            event_id: EVENT_ID,
            tier: EntitlementTier::Standard,
            purchased_at: Utc::now(),
        }
    }

    fn premium_ticket() -> Ticket {
        Ticket {
            tier: EntitlementTier::Premium,
            ..standard_ticket()
        }
    }

    /// Viewer registry that succeeds with quiet defaults.
    fn quiet_viewers() -> MockViewers {
        let mut viewers = MockViewers::new();
        viewers.expect_join().returning(|_, _| Ok(1));
        viewers.expect_leave().returning(|_, _| Ok(0));
        viewers.expect_touch().returning(|_, _| Ok(()));
        viewers.expect_viewer_count().returning(|_| Ok(1));
        viewers.expect_active_viewers().returning(|_| Ok(vec![]));
        viewers.expect_playback_position().returning(|_| Ok(None));
        viewers
            .expect_set_playback_position()
            .returning(|_, _| Ok(()));
        viewers
    }

    fn service(
        events: MockEvents,
        tickets: MockTickets,
        sessions: MockSessions,
        viewers: MockViewers,
    ) -> SessionServiceImpl<MockEvents, MockTickets, MockSessions, MockViewers> {
        SessionServiceImpl::new(
            Arc::new(events),
            Arc::new(tickets),
            Arc::new(sessions),
            Arc::new(viewers),
            policy(),
        )
    }

    #[tokio::test]
    async fn second_device_is_rejected_with_max_viewers() {
        let mut events = MockEvents::new();
        events
            .expect_find_by_id()
            .with(eq(EVENT_ID))
            .returning(|_| Ok(Some(live_event())));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![standard_ticket()]));

        let mut sessions = MockSessions::new();
        sessions.expect_total_view_seconds().returning(|_, _| Ok(0));
        sessions.expect_find_active().returning(|_, _, _| Ok(None));
        // One device already active for this user+event
        sessions
            .expect_count_active_devices()
            .returning(|_, _| Ok(1));
        sessions.expect_create().never();

        let svc = service(events, tickets, sessions, quiet_viewers());
        let err = svc
            .start(EVENT_ID, USER_ID, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::MaxViewersReached { max_devices: 1 }
        ));
    }

    #[tokio::test]
    async fn exhausted_budget_is_rejected_before_admission() {
        let mut events = MockEvents::new();
        events
            .expect_find_by_id()
            .returning(|_| Ok(Some(live_event())));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![standard_ticket()]));

        let mut sessions = MockSessions::new();
        sessions
            .expect_total_view_seconds()
            .returning(|_, _| Ok(3600));
        sessions.expect_find_active().never();
        sessions.expect_create().never();

        let svc = service(events, tickets, sessions, quiet_viewers());
        let err = svc
            .start(EVENT_ID, USER_ID, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::TimeLimitReached {
                used: 3600,
                allowed: 3600
            }
        ));
    }

    #[tokio::test]
    async fn readmitting_the_same_device_does_not_create_a_session() {
        let device_id = Uuid::new_v4();

        let mut events = MockEvents::new();
        events
            .expect_find_by_id()
            .returning(|_| Ok(Some(live_event())));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![standard_ticket()]));

        let mut sessions = MockSessions::new();
        sessions
            .expect_total_view_seconds()
            .returning(|_, _| Ok(120));
        sessions.expect_find_active().returning(move |_, _, _| {
            Ok(Some(ViewSession::new(EVENT_ID, USER_ID, device_id)))
        });
        sessions
            .expect_count_active_devices()
            .returning(|_, _| Ok(1));
        sessions.expect_create().never();

        let svc = service(events, tickets, sessions, quiet_viewers());
        let snapshot = svc.start(EVENT_ID, USER_ID, device_id).await.unwrap();

        assert!(snapshot.session_active);
        assert_eq!(snapshot.time_remaining, Some(3480));
        assert_eq!(snapshot.max_time, Some(3600));
        assert!(!snapshot.is_premium);
    }

    #[tokio::test]
    async fn heartbeat_exhaustion_deactivates_and_reports_terminal_state() {
        let device_id = Uuid::new_v4();

        let mut events = MockEvents::new();
        events
            .expect_find_by_id()
            .returning(|_| Ok(Some(live_event())));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![standard_ticket()]));

        let mut sessions = MockSessions::new();
        sessions.expect_find_active().returning(move |_, _, _| {
            Ok(Some(ViewSession::new(EVENT_ID, USER_ID, device_id)))
        });
        sessions.expect_record_heartbeat().returning(|_, _| Ok(()));
        sessions
            .expect_total_view_seconds()
            .returning(|_, _| Ok(3600));
        sessions.expect_deactivate().times(1).returning(|_| Ok(()));
        sessions
            .expect_count_active_devices()
            .returning(|_, _| Ok(0));

        let svc = service(events, tickets, sessions, quiet_viewers());
        let snapshot = svc
            .heartbeat(EVENT_ID, USER_ID, device_id, Some(3599.0))
            .await
            .unwrap();

        assert!(!snapshot.session_active);
        assert_eq!(snapshot.time_remaining, Some(0));
        assert_eq!(snapshot.total_view_time, 3600);
    }

    #[tokio::test]
    async fn premium_ticket_has_no_budget() {
        let device_id = Uuid::new_v4();

        let mut events = MockEvents::new();
        events
            .expect_find_by_id()
            .returning(|_| Ok(Some(live_event())));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![premium_ticket()]));

        let mut sessions = MockSessions::new();
        sessions
            .expect_total_view_seconds()
            .returning(|_, _| Ok(999_999));
        sessions.expect_find_active().returning(|_, _, _| Ok(None));
        sessions
            .expect_count_active_devices()
            .returning(|_, _| Ok(0));
        sessions
            .expect_create()
            .returning(|s| Ok(s.clone()));

        let svc = service(events, tickets, sessions, quiet_viewers());
        let snapshot = svc.start(EVENT_ID, USER_ID, device_id).await.unwrap();

        assert!(snapshot.is_premium);
        assert_eq!(snapshot.time_remaining, None);
        assert_eq!(snapshot.max_time, None);
    }

    #[tokio::test]
    async fn creator_bypasses_the_ticket_check() {
        let mut events = MockEvents::new();
        events
            .expect_find_by_id()
            .returning(|_| Ok(Some(live_event())));

        // Ticket lookup must never happen for the creator
        let mut tickets = MockTickets::new();
        tickets.expect_find_for_user_event().never();

        let mut sessions = MockSessions::new();
        sessions.expect_total_view_seconds().returning(|_, _| Ok(0));
        sessions.expect_find_active().returning(|_, _, _| Ok(None));
        sessions
            .expect_count_active_devices()
            .returning(|_, _| Ok(0));
        sessions.expect_create().returning(|s| Ok(s.clone()));

        let svc = service(events, tickets, sessions, quiet_viewers());
        let snapshot = svc
            .start(EVENT_ID, CREATOR_ID, Uuid::new_v4())
            .await
            .unwrap();

        assert!(snapshot.is_premium);
    }

    #[tokio::test]
    async fn upcoming_event_rejects_admission() {
        let mut events = MockEvents::new();
        events.expect_find_by_id().returning(|_| {
            Ok(Some(LiveEvent {
                status: EventStatus::Upcoming,
                ..live_event()
            }))
        });

        let tickets = MockTickets::new();
        let sessions = MockSessions::new();

        let svc = service(events, tickets, sessions, quiet_viewers());
        let err = svc
            .start(EVENT_ID, USER_ID, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::NotLive));
    }

    #[tokio::test]
    async fn ticketless_user_is_denied() {
        let mut events = MockEvents::new();
        events
            .expect_find_by_id()
            .returning(|_| Ok(Some(live_event())));

        let mut tickets = MockTickets::new();
        tickets
            .expect_find_for_user_event()
            .returning(|_, _| Ok(vec![]));

        let sessions = MockSessions::new();

        let svc = service(events, tickets, sessions, quiet_viewers());
        let err = svc
            .start(EVENT_ID, USER_ID, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::NoTicket));
    }
}
