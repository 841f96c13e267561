//! Session Handlers
//!
//! One endpoint drives the session lifecycle; the `action` field selects
//! start, heartbeat, or end. Terminal admission failures map onto their
//! own HTTP statuses so clients can distinguish them from transient errors:
//! 403 for a spent watch budget, 429 for the device ceiling.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::application::dto::request::{SessionAction, SessionActionRequest};
use crate::application::dto::response::SessionStateResponse;
use crate::application::services::{
    SessionError, SessionService, SessionServiceImpl, SessionSnapshot,
};
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::{
    PgEventRepository, PgTicketRepository, PgViewSessionRepository,
};
use crate::presentation::http::extractors::Identity;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Helper to convert SessionError to AppError
fn map_session_error(e: SessionError) -> AppError {
    match e {
        SessionError::EventNotFound => AppError::NotFound("Event not found".into()),
        SessionError::NotLive => AppError::Forbidden("Event is not live".into()),
        SessionError::NoTicket => AppError::Forbidden("No ticket for this event".into()),
        SessionError::TimeLimitReached { used, allowed } => {
            let pct = if allowed > 0 {
                (used * 100 / allowed).min(100)
            } else {
                100
            };
            AppError::TimeLimitReached(format!("{}% of allowed time used", pct))
        }
        SessionError::MaxViewersReached { max_devices } => {
            let message = if max_devices == 1 {
                "This content can only be viewed on one device at a time.".to_string()
            } else {
                format!(
                    "This content can be viewed on at most {} devices at a time.",
                    max_devices
                )
            };
            AppError::MaxViewersReached(message)
        }
        SessionError::SessionNotFound => {
            AppError::NotFound("No active session for this device".into())
        }
        SessionError::Internal(msg) => AppError::Internal(msg),
    }
}

fn to_response(snapshot: SessionSnapshot) -> SessionStateResponse {
    SessionStateResponse {
        session_active: snapshot.session_active,
        time_remaining: snapshot.time_remaining,
        total_view_time: snapshot.total_view_time,
        max_time: snapshot.max_time,
        device_count: snapshot.device_count,
        is_premium: snapshot.is_premium,
        heartbeat_interval: snapshot.heartbeat_interval_ms,
        playback_position: snapshot.playback_position.0,
        current_viewers: snapshot.current_viewers,
        active_viewers: snapshot.active_viewers,
    }
}

/// Drive the session lifecycle
///
/// POST /api/live-stream/session
pub async fn session_action(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<SessionActionRequest>,
) -> Result<(StatusCode, Json<SessionStateResponse>), AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let events = Arc::new(PgEventRepository::new(state.db.clone()));
    let tickets = Arc::new(PgTicketRepository::new(state.db.clone()));
    let sessions = Arc::new(PgViewSessionRepository::new(state.db.clone()));

    let service = SessionServiceImpl::new(
        events,
        tickets,
        sessions,
        state.registry.clone(),
        state.settings.session.clone(),
    );

    match body.action {
        SessionAction::Start => {
            let result = service
                .start(body.event_id, identity.user_id, body.device_id)
                .await;

            match &result {
                Ok(_) => metrics::record_admission("started"),
                Err(SessionError::TimeLimitReached { .. }) => {
                    metrics::record_admission("time_limit")
                }
                Err(SessionError::MaxViewersReached { .. }) => {
                    metrics::record_admission("max_viewers")
                }
                Err(SessionError::NoTicket) | Err(SessionError::NotLive) => {
                    metrics::record_admission("denied")
                }
                Err(_) => metrics::record_admission("error"),
            }

            let snapshot = result.map_err(map_session_error)?;
            Ok((StatusCode::OK, Json(to_response(snapshot))))
        }
        SessionAction::Heartbeat => {
            let result = service
                .heartbeat(
                    body.event_id,
                    identity.user_id,
                    body.device_id,
                    body.current_time,
                )
                .await;

            match &result {
                Ok(snapshot) if !snapshot.session_active => {
                    metrics::record_heartbeat("exhausted")
                }
                Ok(_) => metrics::record_heartbeat("ok"),
                Err(_) => metrics::record_heartbeat("error"),
            }

            let snapshot = result.map_err(map_session_error)?;
            Ok((StatusCode::OK, Json(to_response(snapshot))))
        }
        SessionAction::End => {
            service
                .end(
                    body.event_id,
                    identity.user_id,
                    body.device_id,
                    body.duration,
                )
                .await
                .map_err(map_session_error)?;

            // The endpoint always answers with entitlement state; after end,
            // the session is inactive but the totals remain visible
            let sessions = PgViewSessionRepository::new(state.db.clone());
            use crate::domain::ViewSessionRepository;
            let total = sessions
                .total_view_seconds(body.event_id, identity.user_id)
                .await?;
            let device_count = sessions
                .count_active_devices(body.event_id, identity.user_id)
                .await?;

            Ok((
                StatusCode::OK,
                Json(SessionStateResponse {
                    session_active: false,
                    time_remaining: None,
                    total_view_time: total,
                    max_time: None,
                    device_count,
                    is_premium: false,
                    heartbeat_interval: state.settings.session.heartbeat_interval_ms,
                    playback_position: 0.0,
                    current_viewers: 0,
                    active_viewers: Vec::new(),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_limit_error_reports_percentage() {
        let err = map_session_error(SessionError::TimeLimitReached {
            used: 3600,
            allowed: 3600,
        });
        match err {
            AppError::TimeLimitReached(msg) => {
                assert_eq!(msg, "100% of allowed time used")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn single_device_ceiling_has_the_product_message() {
        let err = map_session_error(SessionError::MaxViewersReached { max_devices: 1 });
        match err {
            AppError::MaxViewersReached(msg) => {
                assert_eq!(
                    msg,
                    "This content can only be viewed on one device at a time."
                )
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
