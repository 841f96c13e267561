//! Wire Format Tests
//!
//! The JSON contract between player front ends and the service: request
//! parsing, response field casing, and the tagged sync-socket messages.

use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use stream_gate::application::dto::request::{SessionAction, SessionActionRequest};
use stream_gate::application::dto::response::CheckAccessResponse;
use stream_gate::presentation::websocket::messages::{ClientMessage, ServerMessage};

use crate::common::{active_snapshot, denied_access, granted_access};

#[test]
fn session_request_parses_camel_case() {
    let device_id = Uuid::new_v4();
    let body = json!({
        "eventId": 11,
        "action": "start",
        "deviceId": device_id,
    });

    let request: SessionActionRequest = serde_json::from_value(body).unwrap();
    assert_eq!(request.event_id, 11);
    assert_eq!(request.action, SessionAction::Start);
    assert_eq!(request.device_id, device_id);
    assert!(request.current_time.is_none());
}

#[test]
fn session_state_serializes_camel_case() {
    let value = serde_json::to_value(active_snapshot(30000, 42.5)).unwrap();

    assert_eq!(value["sessionActive"], json!(true));
    assert_eq!(value["timeRemaining"], json!(3000));
    assert_eq!(value["totalViewTime"], json!(600));
    assert_eq!(value["maxTime"], json!(3600));
    assert_eq!(value["heartbeatInterval"], json!(30000));
    assert_eq!(value["playbackPosition"], json!(42.5));
    assert_eq!(value["isPremium"], json!(false));
}

#[test]
fn denied_access_omits_viewer_fields() {
    let value = serde_json::to_value(denied_access("NO_TICKET")).unwrap();

    assert_eq!(value["hasAccess"], json!(false));
    assert_eq!(value["reason"], json!("NO_TICKET"));
    // No viewer data leaks to viewers without access
    assert!(value.get("activeViewers").is_none());
    assert!(value.get("currentViewers").is_none());
    assert!(value.get("playbackPosition").is_none());
}

#[test]
fn granted_access_round_trips() {
    let serialized = serde_json::to_string(&granted_access()).unwrap();
    let parsed: CheckAccessResponse = serde_json::from_str(&serialized).unwrap();

    assert!(parsed.has_access);
    assert!(parsed.event.is_some());
}

#[test]
fn sync_socket_messages_are_type_tagged() {
    let device_id = Uuid::new_v4();

    let join: ClientMessage = serde_json::from_value(json!({
        "type": "join",
        "deviceId": device_id,
        "userId": 7,
    }))
    .unwrap();
    assert!(matches!(join, ClientMessage::Join { device_id: id, user_id: 7 } if id == device_id));

    let sync = serde_json::to_value(ServerMessage::PlaybackSync {
        position: 73.25,
        device_id,
        event_id: 11,
        user_id: 7,
    })
    .unwrap();
    assert_eq!(
        sync,
        json!({
            "type": "playbackSync",
            "position": 73.25,
            "deviceId": device_id,
            "eventId": 11,
            "userId": 7,
        })
    );

    let count = serde_json::to_value(ServerMessage::ViewerCount { count: 3 }).unwrap();
    assert_eq!(count["type"], json!("viewerCount"));
}

#[test]
fn malformed_socket_frames_are_rejected() {
    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"join"}"#).is_err());
    assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
}
