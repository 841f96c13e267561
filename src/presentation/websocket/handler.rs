//! WebSocket Connection Handler
//!
//! Handles one watching device's sync connection. The client must announce
//! itself with a `join` message before anything is fanned out; after that,
//! playback reports are rebroadcast to the rest of the room and roster
//! changes reach everyone.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use super::messages::{ClientMessage, ServerMessage};
use crate::domain::{PlaybackPosition, ViewerRegistry};
use crate::infrastructure::metrics;
use crate::startup::AppState;

const JOIN_TIMEOUT: Duration = Duration::from_secs(30);

/// WebSocket upgrade handler for `/api/live-stream/{event_id}/ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Response {
    ws.max_message_size(state.settings.websocket.max_message_size)
        .max_frame_size(state.settings.websocket.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, event_id, state))
}

/// Handle one device's sync connection for an event.
async fn handle_socket(socket: WebSocket, event_id: i64, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Forward queued server messages to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // The first frame must be a join announcing the device and viewer
    let (device_id, user_id) = match timeout(JOIN_TIMEOUT, wait_for_join(&mut receiver)).await {
        Ok(Some(pair)) => pair,
        Ok(None) => {
            tracing::debug!(event_id, "Connection closed before join");
            sender_task.abort();
            return;
        }
        Err(_) => {
            tracing::debug!(event_id, "Join timeout");
            sender_task.abort();
            return;
        }
    };

    state.gateway.register(event_id, device_id, tx);

    // Idempotent with the HTTP session start; covers the ordering race
    // between the two
    if let Err(e) = state.registry.join(event_id, device_id).await {
        tracing::warn!(event_id, error = %e, "Failed to add viewer on join");
    }

    if let Err(e) = announce_roster(&state, event_id).await {
        tracing::warn!(event_id, error = %e, "Failed to announce roster on join");
    }

    metrics::set_websocket_connections(
        state.gateway.connection_count() as i64,
        state.gateway.connection_count() as i64,
    );

    // Main message loop
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::PlaybackSync {
                    device_id: origin,
                    position,
                }) => {
                    let position = PlaybackPosition::new(position);
                    if let Err(e) = state
                        .registry
                        .set_playback_position(event_id, position)
                        .await
                    {
                        tracing::warn!(event_id, error = %e, "Failed to store playback position");
                    }
                    // The reporting device already plays at this position
                    state.gateway.broadcast_except(
                        event_id,
                        origin,
                        ServerMessage::PlaybackSync {
                            position: position.0,
                            device_id: origin,
                            event_id,
                            user_id,
                        },
                    );
                }
                Ok(ClientMessage::Leave { .. }) => {
                    tracing::debug!(event_id, device_id = %device_id, "Device left explicitly");
                    break;
                }
                Ok(ClientMessage::Join { .. }) => {
                    // Already joined; treat as a liveness refresh
                    if let Err(e) = state.registry.touch(event_id, device_id).await {
                        tracing::warn!(event_id, error = %e, "Failed to refresh viewer");
                    }
                }
                // Malformed frames are logged and dropped, never fatal
                Err(e) => {
                    tracing::debug!(
                        event_id,
                        device_id = %device_id,
                        error = %e,
                        "Dropping malformed frame"
                    );
                }
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(event_id, device_id = %device_id, "Connection closed");
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
            }
            Err(e) => {
                tracing::debug!(event_id, device_id = %device_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Cleanup
    state.gateway.unregister(event_id, device_id);
    if let Err(e) = state.registry.leave(event_id, device_id).await {
        tracing::warn!(event_id, error = %e, "Failed to remove viewer on disconnect");
    }

    if let Err(e) = announce_roster(&state, event_id).await {
        tracing::warn!(event_id, error = %e, "Failed to announce roster on leave");
    }

    metrics::set_websocket_connections(
        state.gateway.connection_count() as i64,
        state.gateway.connection_count() as i64,
    );
}

/// Read frames until a join arrives, the peer closes, or the stream errors.
async fn wait_for_join(
    receiver: &mut (impl StreamExt<Item = Result<Message, axum::Error>> + Unpin),
) -> Option<(Uuid, i64)> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(ClientMessage::Join { device_id, user_id }) =
                    serde_json::from_str::<ClientMessage>(&text)
                {
                    return Some((device_id, user_id));
                }
                // Anything else before join is dropped
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => continue,
        }
    }
    None
}

/// Push the current count and roster to everyone in the room.
async fn announce_roster(state: &AppState, event_id: i64) -> Result<(), crate::shared::error::AppError> {
    let count = state.registry.viewer_count(event_id).await?;
    let viewers = state.registry.active_viewers(event_id).await?;

    metrics::set_active_viewers(event_id, count);

    state
        .gateway
        .broadcast(event_id, ServerMessage::ViewerCount { count });
    state
        .gateway
        .broadcast(event_id, ServerMessage::ActiveViewers { viewers });

    Ok(())
}
