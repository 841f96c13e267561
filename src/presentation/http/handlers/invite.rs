//! Invite Handlers
//!
//! HTTP handler for premium companion-device invites.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::InviteRequest;
use crate::application::dto::response::InviteResponse;
use crate::application::services::{InviteError, InviteService, InviteServiceImpl};
use crate::infrastructure::repositories::{
    PgDeviceInviteRepository, PgEventRepository, PgTicketRepository, PgViewSessionRepository,
};
use crate::presentation::http::extractors::Identity;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Helper to convert InviteError to AppError
fn map_invite_error(e: InviteError) -> AppError {
    match e {
        InviteError::EventNotFound => AppError::NotFound("Event not found".into()),
        InviteError::NotPremium => {
            AppError::Forbidden("Only premium ticket holders can invite devices".into())
        }
        InviteError::DeviceLimitReached { max_devices } => AppError::MaxViewersReached(format!(
            "This content can be viewed on at most {} devices at a time.",
            max_devices
        )),
        InviteError::InvalidCode => AppError::BadRequest("Invalid invite code".into()),
        InviteError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Create a companion-device invite
///
/// POST /api/live-stream/invite
pub async fn create_invite(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<InviteRequest>,
) -> Result<(StatusCode, Json<InviteResponse>), AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let events = Arc::new(PgEventRepository::new(state.db.clone()));
    let tickets = Arc::new(PgTicketRepository::new(state.db.clone()));
    let sessions = Arc::new(PgViewSessionRepository::new(state.db.clone()));
    let invites = Arc::new(PgDeviceInviteRepository::new(state.db.clone()));

    let service = InviteServiceImpl::new(
        events,
        tickets,
        sessions,
        invites,
        state.settings.session.clone(),
    );

    let invite = service
        .create_invite(body.event_id, identity.user_id, body.email)
        .await
        .map_err(map_invite_error)?;

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            code: invite.code,
            email: invite.email,
            expires_at: invite.expires_at,
        }),
    ))
}

/// Validate an invite code before the companion device starts a session
///
/// GET /api/live-stream/invite/{code}
pub async fn validate_invite(
    State(state): State<AppState>,
    _identity: Identity,
    Path(code): Path<String>,
) -> Result<Json<InviteResponse>, AppError> {
    let events = Arc::new(PgEventRepository::new(state.db.clone()));
    let tickets = Arc::new(PgTicketRepository::new(state.db.clone()));
    let sessions = Arc::new(PgViewSessionRepository::new(state.db.clone()));
    let invites = Arc::new(PgDeviceInviteRepository::new(state.db.clone()));

    let service = InviteServiceImpl::new(
        events,
        tickets,
        sessions,
        invites,
        state.settings.session.clone(),
    );

    let invite = service
        .validate_code(&code)
        .await
        .map_err(map_invite_error)?;

    Ok(Json(InviteResponse {
        code: invite.code,
        email: invite.email,
        expires_at: invite.expires_at,
    }))
}
