//! Invite Service
//!
//! Premium viewers can mint short-lived invite codes that let a companion
//! device join an event. Standard tickets never reach this path; the
//! extra-device ceiling still applies when the invited device starts a
//! session.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SessionPolicySettings;
use crate::domain::{
    DeviceInvite, DeviceInviteRepository, EventRepository, TicketRepository,
    ViewSessionRepository,
};

/// Invite service trait.
#[async_trait]
pub trait InviteService: Send + Sync {
    /// Mint an invite code for a companion device.
    async fn create_invite(
        &self,
        event_id: i64,
        inviter_id: i64,
        email: String,
    ) -> Result<DeviceInvite, InviteError>;

    /// Look up an invite code and reject it if expired.
    async fn validate_code(&self, code: &str) -> Result<DeviceInvite, InviteError>;
}

/// Invite service errors.
#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("Event not found")]
    EventNotFound,

    #[error("Only premium ticket holders can invite devices")]
    NotPremium,

    #[error("Device limit reached ({max_devices} devices)")]
    DeviceLimitReached { max_devices: i64 },

    #[error("Invite code not found or expired")]
    InvalidCode,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Invite service implementation.
pub struct InviteServiceImpl<E, T, S, I>
where
    E: EventRepository,
    T: TicketRepository,
    S: ViewSessionRepository,
    I: DeviceInviteRepository,
{
    events: Arc<E>,
    tickets: Arc<T>,
    sessions: Arc<S>,
    invites: Arc<I>,
    policy: SessionPolicySettings,
}

impl<E, T, S, I> InviteServiceImpl<E, T, S, I>
where
    E: EventRepository,
    T: TicketRepository,
    S: ViewSessionRepository,
    I: DeviceInviteRepository,
{
    /// Create a new InviteServiceImpl.
    pub fn new(
        events: Arc<E>,
        tickets: Arc<T>,
        sessions: Arc<S>,
        invites: Arc<I>,
        policy: SessionPolicySettings,
    ) -> Self {
        Self {
            events,
            tickets,
            sessions,
            invites,
            policy,
        }
    }
}

#[async_trait]
impl<E, T, S, I> InviteService for InviteServiceImpl<E, T, S, I>
where
    E: EventRepository + 'static,
    T: TicketRepository + 'static,
    S: ViewSessionRepository + 'static,
    I: DeviceInviteRepository + 'static,
{
    async fn create_invite(
        &self,
        event_id: i64,
        inviter_id: i64,
        email: String,
    ) -> Result<DeviceInvite, InviteError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await
            .map_err(|e| InviteError::Internal(e.to_string()))?
            .ok_or(InviteError::EventNotFound)?;

        let is_creator = event.creator_id == inviter_id;

        if !is_creator {
            let tickets = self
                .tickets
                .find_for_user_event(inviter_id, event_id)
                .await
                .map_err(|e| InviteError::Internal(e.to_string()))?;

            if !tickets.iter().any(|t| t.is_premium()) {
                return Err(InviteError::NotPremium);
            }
        }

        let devices = self
            .sessions
            .count_active_devices(event_id, inviter_id)
            .await
            .map_err(|e| InviteError::Internal(e.to_string()))?;

        let max_devices = self.policy.max_devices(true);
        if devices >= max_devices {
            return Err(InviteError::DeviceLimitReached { max_devices });
        }

        let invite = DeviceInvite::new(event_id, inviter_id, email, self.policy.invite_ttl_secs);
        let invite = self
            .invites
            .create(&invite)
            .await
            .map_err(|e| InviteError::Internal(e.to_string()))?;

        tracing::info!(
            event_id,
            inviter_id,
            code = %invite.code,
            "Device invite created"
        );

        Ok(invite)
    }

    async fn validate_code(&self, code: &str) -> Result<DeviceInvite, InviteError> {
        let invite = self
            .invites
            .find_by_code(code)
            .await
            .map_err(|e| InviteError::Internal(e.to_string()))?
            .ok_or(InviteError::InvalidCode)?;

        if invite.is_expired() {
            return Err(InviteError::InvalidCode);
        }

        Ok(invite)
    }
}
