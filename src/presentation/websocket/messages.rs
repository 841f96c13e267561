//! WebSocket Message Types
//!
//! Wire format for the per-event sync channel. Messages are JSON objects
//! tagged by a `type` field.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages a watching client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Announce this device to the event's audience.
    #[serde(rename_all = "camelCase")]
    Join { device_id: Uuid, user_id: i64 },

    /// Leave the audience explicitly (navigation away).
    #[serde(rename_all = "camelCase")]
    Leave { device_id: Uuid },

    /// Share the local playback position with the rest of the audience.
    #[serde(rename_all = "camelCase")]
    PlaybackSync { device_id: Uuid, position: f64 },
}

/// Messages the server pushes to watching clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Current audience size for the event.
    #[serde(rename_all = "camelCase")]
    ViewerCount { count: i64 },

    /// Devices currently counted as watching.
    #[serde(rename_all = "camelCase")]
    ActiveViewers { viewers: Vec<Uuid> },

    /// Authoritative playback position, fanned out to every device except
    /// the one that reported it. Carries the originating device so
    /// receivers can ignore their own echoes.
    #[serde(rename_all = "camelCase")]
    PlaybackSync {
        position: f64,
        device_id: Uuid,
        event_id: i64,
        user_id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn join_deserializes() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"join","deviceId":"7f8b5c1e-2f63-4f0a-9be1-57b21a0c2e11","userId":7}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::Join { user_id: 7, .. }));
    }

    #[test]
    fn join_without_user_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(
            r#"{"type":"join","deviceId":"7f8b5c1e-2f63-4f0a-9be1-57b21a0c2e11"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn playback_sync_round_trips_the_tag() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"playbackSync","deviceId":"7f8b5c1e-2f63-4f0a-9be1-57b21a0c2e11","position":73.25}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::PlaybackSync { position, .. } => assert_eq!(position, 73.25),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn viewer_count_serializes_camel_case() {
        let json = serde_json::to_string(&ServerMessage::ViewerCount { count: 7 }).unwrap();
        assert_eq!(json, r#"{"type":"viewerCount","count":7}"#);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"hijack"}"#);
        assert!(result.is_err());
    }
}
