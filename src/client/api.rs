//! Session API Contract
//!
//! The wire operations the controller needs from the service, expressed as
//! a trait so hosts supply their own transport. Responses reuse the
//! service's own DTOs, so both halves of the protocol share one wire
//! vocabulary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dto::response::{CheckAccessResponse, SessionStateResponse};

/// Errors surfaced by a [`SessionApi`] implementation.
///
/// Terminal variants mirror the service's admission statuses: 403 for a
/// spent watch budget, 429 for the device ceiling. Everything else is
/// either a denial or a transport problem the controller may retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// HTTP 403 from the session endpoint: watch budget exhausted.
    #[error("Time limit reached: {0}")]
    TimeLimitReached(String),

    /// HTTP 429 from the session endpoint: concurrent device ceiling.
    #[error("Maximum concurrent viewers reached: {0}")]
    MaxViewersReached(String),

    /// Access denied for a non-budget reason (no ticket, event not live).
    #[error("Access denied: {0}")]
    Denied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or server failure; the request may be retried.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Terminal errors end the session permanently; retrying is pointless.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApiError::TimeLimitReached(_) | ApiError::MaxViewersReached(_) | ApiError::Denied(_)
        )
    }
}

/// Transport-agnostic view of the viewing-session endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// `GET /api/live-stream/{event_id}/check-access`
    async fn check_access(&self, event_id: i64) -> Result<CheckAccessResponse, ApiError>;

    /// `POST /api/live-stream/session` with `action: start`
    async fn start_session(
        &self,
        event_id: i64,
        device_id: Uuid,
    ) -> Result<SessionStateResponse, ApiError>;

    /// `POST /api/live-stream/session` with `action: heartbeat`
    async fn heartbeat(
        &self,
        event_id: i64,
        device_id: Uuid,
        current_time: Option<f64>,
    ) -> Result<SessionStateResponse, ApiError>;

    /// `POST /api/live-stream/session` with `action: end`
    async fn end_session(
        &self,
        event_id: i64,
        device_id: Uuid,
        duration: Option<i64>,
    ) -> Result<(), ApiError>;
}
