//! Access Check Handler
//!
//! The watch-page gate: may this user see the player for this event?

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::dto::response::{CheckAccessResponse, EventInfo, TicketInfo};
use crate::application::services::{AccessService, AccessServiceImpl};
use crate::infrastructure::repositories::{PgEventRepository, PgTicketRepository};
use crate::presentation::http::extractors::Identity;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Check viewing access for an event
///
/// GET /api/live-stream/{event_id}/check-access
///
/// Always returns 200 with `hasAccess` so the player can render the right
/// screen; only a missing event is a 404. Viewer and playback details are
/// included when access is granted so the player can seed its state before
/// opening the sync socket.
pub async fn check_access(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i64>,
) -> Result<Json<CheckAccessResponse>, AppError> {
    let events = Arc::new(PgEventRepository::new(state.db.clone()));
    let tickets = Arc::new(PgTicketRepository::new(state.db.clone()));

    let service = AccessServiceImpl::new(events, tickets, state.registry.clone());

    let decision = service.check_access(event_id, identity.user_id).await?;

    let response = if decision.has_access {
        CheckAccessResponse {
            has_access: true,
            is_creator: decision.is_creator,
            reason: None,
            event: Some(EventInfo::from(&decision.event)),
            tickets: Some(decision.tickets.iter().map(TicketInfo::from).collect()),
            active_viewers: Some(decision.active_viewers),
            current_viewers: Some(decision.current_viewers),
            playback_position: decision.playback_position.map(|p| p.0),
        }
    } else {
        CheckAccessResponse {
            has_access: false,
            is_creator: false,
            reason: decision.reason.map(|r| r.as_str().to_string()),
            event: Some(EventInfo::from(&decision.event)),
            tickets: None,
            active_viewers: None,
            current_viewers: None,
            playback_position: None,
        }
    };

    Ok(Json(response))
}
