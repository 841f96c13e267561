//! Common Test Utilities
//!
//! A scripted [`SessionApi`] implementation and response builders shared by
//! the flow tests. Each operation pops the next scripted result; running off
//! the end surfaces as a transport error, which keeps over-eager loops
//! visible in test failures.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use stream_gate::application::dto::response::{
    CheckAccessResponse, EventInfo, SessionStateResponse,
};
use stream_gate::client::{ApiError, SessionApi};
use stream_gate::domain::EventStatus;

pub const EVENT_ID: i64 = 11;

#[derive(Default)]
pub struct ScriptedApi {
    access: Mutex<VecDeque<Result<CheckAccessResponse, ApiError>>>,
    starts: Mutex<VecDeque<Result<SessionStateResponse, ApiError>>>,
    heartbeats: Mutex<VecDeque<Result<SessionStateResponse, ApiError>>>,
    /// Every end_session call, recorded as (event_id, device_id, duration)
    pub ended: Mutex<Vec<(i64, Uuid, Option<i64>)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_access(&self, result: Result<CheckAccessResponse, ApiError>) {
        self.access.lock().push_back(result);
    }

    pub fn script_start(&self, result: Result<SessionStateResponse, ApiError>) {
        self.starts.lock().push_back(result);
    }

    pub fn script_heartbeat(&self, result: Result<SessionStateResponse, ApiError>) {
        self.heartbeats.lock().push_back(result);
    }
}

fn unscripted<T>(operation: &str) -> Result<T, ApiError> {
    Err(ApiError::Transport(format!("unscripted {} call", operation)))
}

#[async_trait]
impl SessionApi for ScriptedApi {
    async fn check_access(&self, _event_id: i64) -> Result<CheckAccessResponse, ApiError> {
        self.access
            .lock()
            .pop_front()
            .unwrap_or_else(|| unscripted("check_access"))
    }

    async fn start_session(
        &self,
        _event_id: i64,
        _device_id: Uuid,
    ) -> Result<SessionStateResponse, ApiError> {
        self.starts
            .lock()
            .pop_front()
            .unwrap_or_else(|| unscripted("start_session"))
    }

    async fn heartbeat(
        &self,
        _event_id: i64,
        _device_id: Uuid,
        _current_time: Option<f64>,
    ) -> Result<SessionStateResponse, ApiError> {
        self.heartbeats
            .lock()
            .pop_front()
            .unwrap_or_else(|| unscripted("heartbeat"))
    }

    async fn end_session(
        &self,
        event_id: i64,
        device_id: Uuid,
        duration: Option<i64>,
    ) -> Result<(), ApiError> {
        self.ended.lock().push((event_id, device_id, duration));
        Ok(())
    }
}

pub fn live_event() -> EventInfo {
    EventInfo {
        id: EVENT_ID,
        title: "Launch Premiere".into(),
        status: EventStatus::Live,
        streaming_at: Utc::now(),
    }
}

pub fn upcoming_event(starts_in_secs: i64) -> EventInfo {
    EventInfo {
        status: EventStatus::Upcoming,
        streaming_at: Utc::now() + chrono::Duration::seconds(starts_in_secs),
        ..live_event()
    }
}

pub fn upcoming_access(starts_in_secs: i64) -> CheckAccessResponse {
    CheckAccessResponse {
        event: Some(upcoming_event(starts_in_secs)),
        ..granted_access()
    }
}

pub fn granted_access() -> CheckAccessResponse {
    CheckAccessResponse {
        has_access: true,
        is_creator: false,
        reason: None,
        event: Some(live_event()),
        tickets: Some(vec![]),
        active_viewers: Some(vec![]),
        current_viewers: Some(1),
        playback_position: None,
    }
}

pub fn denied_access(reason: &str) -> CheckAccessResponse {
    CheckAccessResponse {
        has_access: false,
        is_creator: false,
        reason: Some(reason.to_string()),
        event: Some(live_event()),
        tickets: None,
        active_viewers: None,
        current_viewers: None,
        playback_position: None,
    }
}

pub fn active_snapshot(heartbeat_interval: u64, playback_position: f64) -> SessionStateResponse {
    SessionStateResponse {
        session_active: true,
        time_remaining: Some(3000),
        total_view_time: 600,
        max_time: Some(3600),
        device_count: 1,
        is_premium: false,
        heartbeat_interval,
        playback_position,
        current_viewers: 1,
        active_viewers: vec![],
    }
}

pub fn exhausted_snapshot() -> SessionStateResponse {
    SessionStateResponse {
        session_active: false,
        time_remaining: Some(0),
        total_view_time: 3600,
        ..active_snapshot(1000, 0.0)
    }
}
