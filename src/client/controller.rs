//! Session Controller
//!
//! The state machine a player front end drives. One controller instance
//! owns one device's view of one event: it checks access, starts the
//! session, keeps the heartbeat cadence the server dictates, reconciles
//! playback, and lands in a terminal state when the server says so.
//!
//! Lifecycle:
//!
//! ```text
//! Initializing -> Upcoming ----(goes live)----+
//!       |                                     v
//!       +-----------(live + access)--------> Ready -> Starting -> Active
//!       |                                                |
//!       +-> AccessDenied / Expired          TimeLimitReached /
//!                                           MaxViewersReached / Ended
//! ```
//!
//! Terminal states are sticky: once the budget is spent or the device
//! ceiling hit, no further start or heartbeat leaves the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::api::{ApiError, SessionApi};
use super::device::{DeviceIdentity, ViewerContext};
use super::sync::{reconcile, SyncUpdate};
use crate::application::dto::response::SessionStateResponse;
use crate::domain::value_objects::PlaybackPosition;
use crate::domain::EventStatus;

/// How often an upcoming event is re-checked for going live.
const UPCOMING_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Fallback heartbeat cadence until the server dictates one.
const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30000;

/// Drift tolerance before the player snaps to the authoritative position.
const DRIFT_THRESHOLD_SECS: f64 = 3.0;

/// Player-visible controller state.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchState {
    /// Access check in flight.
    Initializing,

    /// The event has not started; poll until it goes live.
    Upcoming { starts_at: DateTime<Utc> },

    /// Access granted, event live, session not yet started.
    Ready,

    /// Session start in flight.
    Starting,

    /// Admitted and heartbeating.
    Active,

    /// No ticket, or the access check failed. Terminal.
    AccessDenied { reason: String },

    /// Watch budget spent. Terminal.
    TimeLimitReached { message: String },

    /// Concurrent device ceiling hit. Terminal.
    MaxViewersReached { message: String },

    /// The event already ended. Terminal.
    Expired,

    /// Stopped by the player.
    Ended,

    /// Unrecoverable transport failure after the retry budget.
    Failed { message: String },
}

impl WatchState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WatchState::AccessDenied { .. }
                | WatchState::TimeLimitReached { .. }
                | WatchState::MaxViewersReached { .. }
                | WatchState::Expired
        )
    }
}

/// Format remaining seconds as `HH:MM:SS` for the upcoming countdown.
pub fn format_countdown(total_secs: i64) -> String {
    let secs = total_secs.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

struct ControllerInner<A: SessionApi> {
    api: Arc<A>,
    ctx: ViewerContext,
    event_id: i64,
    device_id: Uuid,
    state: Mutex<WatchState>,
    /// Local playback position the player keeps current
    playback: Mutex<f64>,
    /// Heartbeat cadence dictated by the server on admission
    heartbeat_interval_ms: Mutex<u64>,
    seeking: AtomicBool,
    /// One automatic re-admission after a transient heartbeat failure
    restarted: AtomicBool,
    heartbeat_task: Mutex<Option<JoinHandle<()>>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl<A: SessionApi> ControllerInner<A> {
    fn set_state(&self, next: WatchState) {
        let mut state = self.state.lock();
        // Terminal states are sticky
        if state.is_terminal() {
            return;
        }
        tracing::debug!(from = ?*state, to = ?next, "Controller state change");
        *state = next;
    }

    fn apply_terminal_error(&self, error: &ApiError) {
        match error {
            ApiError::TimeLimitReached(message) => self.set_state(WatchState::TimeLimitReached {
                message: message.clone(),
            }),
            ApiError::MaxViewersReached(message) => {
                self.set_state(WatchState::MaxViewersReached {
                    message: message.clone(),
                })
            }
            ApiError::Denied(reason) => self.set_state(WatchState::AccessDenied {
                reason: reason.clone(),
            }),
            _ => {}
        }
    }

    /// Reconcile the local position against an authoritative update.
    fn apply_sync(&self, update: SyncUpdate) -> Option<f64> {
        let local = PlaybackPosition::new(*self.playback.lock());
        let snap = reconcile(
            local,
            update,
            DRIFT_THRESHOLD_SECS,
            self.seeking.load(Ordering::Relaxed),
        );
        if let Some(position) = snap {
            *self.playback.lock() = position;
        }
        snap
    }

    fn apply_snapshot(&self, snapshot: &SessionStateResponse) {
        *self.heartbeat_interval_ms.lock() = snapshot.heartbeat_interval;
        self.apply_sync(SyncUpdate::Heartbeat {
            position: snapshot.playback_position,
        });
    }

    /// A heartbeat answered with an inactive session means the budget ran
    /// out mid-watch.
    fn exhausted_message(snapshot: &SessionStateResponse) -> String {
        let pct = match snapshot.max_time {
            Some(max) if max > 0 => (snapshot.total_view_time * 100 / max).min(100),
            _ => 100,
        };
        format!("{}% of allowed time used", pct)
    }
}

/// Viewing-session controller. Cheap to clone; clones share state.
pub struct SessionController<A: SessionApi + 'static> {
    inner: Arc<ControllerInner<A>>,
}

impl<A: SessionApi + 'static> Clone for SessionController<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: SessionApi + 'static> SessionController<A> {
    pub fn new(
        api: Arc<A>,
        identity: &dyn DeviceIdentity,
        ctx: ViewerContext,
        event_id: i64,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                api,
                ctx,
                event_id,
                device_id: identity.device_id(),
                state: Mutex::new(WatchState::Initializing),
                playback: Mutex::new(0.0),
                heartbeat_interval_ms: Mutex::new(DEFAULT_HEARTBEAT_INTERVAL_MS),
                seeking: AtomicBool::new(false),
                restarted: AtomicBool::new(false),
                heartbeat_task: Mutex::new(None),
                poll_task: Mutex::new(None),
            }),
        }
    }

    /// Current state, cloned for the player to render.
    pub fn state(&self) -> WatchState {
        self.inner.state.lock().clone()
    }

    pub fn device_id(&self) -> Uuid {
        self.inner.device_id
    }

    pub fn viewer(&self) -> ViewerContext {
        self.inner.ctx
    }

    /// Local playback position last reported by the player.
    pub fn position(&self) -> f64 {
        *self.inner.playback.lock()
    }

    /// The player calls this as playback advances.
    pub fn set_position(&self, seconds: f64) {
        *self.inner.playback.lock() = seconds.max(0.0);
    }

    /// Scrub state; while true, authoritative positions never override the
    /// viewer's chosen position.
    pub fn set_seeking(&self, seeking: bool) {
        self.inner.seeking.store(seeking, Ordering::Relaxed);
    }

    /// Countdown text for the upcoming screen, `None` in any other state.
    pub fn countdown_text(&self, now: DateTime<Utc>) -> Option<String> {
        match &*self.inner.state.lock() {
            WatchState::Upcoming { starts_at } => {
                Some(format_countdown((*starts_at - now).num_seconds()))
            }
            _ => None,
        }
    }

    /// Run the access check and settle into Upcoming, Ready, Expired, or
    /// AccessDenied.
    ///
    /// The check fails closed: a transport error denies access rather than
    /// showing the player optimistically.
    pub async fn init(&self) -> WatchState {
        let response = match self.inner.api.check_access(self.inner.event_id).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(event_id = self.inner.event_id, error = %e, "Access check failed");
                self.inner.set_state(WatchState::AccessDenied {
                    reason: "ACCESS_CHECK_FAILED".to_string(),
                });
                return self.state();
            }
        };

        if !response.has_access {
            self.inner.set_state(WatchState::AccessDenied {
                reason: response.reason.unwrap_or_else(|| "NO_TICKET".to_string()),
            });
            return self.state();
        }

        if let Some(position) = response.playback_position {
            *self.inner.playback.lock() = position.max(0.0);
        }

        match response.event {
            Some(event) => match event.status {
                EventStatus::Upcoming => {
                    self.inner.set_state(WatchState::Upcoming {
                        starts_at: event.streaming_at,
                    });
                    self.spawn_upcoming_poll(event.streaming_at);
                }
                EventStatus::Live => self.inner.set_state(WatchState::Ready),
                EventStatus::Ended => self.inner.set_state(WatchState::Expired),
            },
            None => self.inner.set_state(WatchState::Ready),
        }

        self.state()
    }

    /// Start the session and begin heartbeating on success.
    pub async fn start(&self) -> WatchState {
        {
            let state = self.inner.state.lock();
            if state.is_terminal() {
                return state.clone();
            }
            if !matches!(*state, WatchState::Ready) {
                return state.clone();
            }
        }

        self.inner.set_state(WatchState::Starting);

        match self
            .inner
            .api
            .start_session(self.inner.event_id, self.inner.device_id)
            .await
        {
            Ok(snapshot) => {
                self.inner.apply_snapshot(&snapshot);
                self.inner.set_state(WatchState::Active);
                self.spawn_heartbeat_loop();
            }
            Err(e) if e.is_terminal() => {
                self.inner.apply_terminal_error(&e);
            }
            Err(e) => {
                tracing::warn!(event_id = self.inner.event_id, error = %e, "Session start failed");
                self.inner.set_state(WatchState::Failed {
                    message: e.to_string(),
                });
            }
        }

        self.state()
    }

    /// Apply an authoritative position pushed over the sync socket.
    /// Returns the position the player should seek to, if any.
    pub fn apply_socket_sync(&self, position: f64) -> Option<f64> {
        self.inner.apply_sync(SyncUpdate::Socket { position })
    }

    /// Stop watching: cancel timers and tell the server the session ended.
    pub async fn stop(&self) {
        self.abort_tasks();

        let duration = *self.inner.playback.lock() as i64;
        if let Err(e) = self
            .inner
            .api
            .end_session(self.inner.event_id, self.inner.device_id, Some(duration))
            .await
        {
            // Best-effort; the server's reaper covers lost end calls
            tracing::debug!(event_id = self.inner.event_id, error = %e, "End session failed");
        }

        self.inner.set_state(WatchState::Ended);
    }

    fn abort_tasks(&self) {
        if let Some(task) = self.inner.heartbeat_task.lock().take() {
            task.abort();
        }
        if let Some(task) = self.inner.poll_task.lock().take() {
            task.abort();
        }
    }

    /// Poll the access check until the event goes live or expires.
    ///
    /// An event still reported upcoming after its scheduled start never
    /// went live; the controller expires it instead of counting down
    /// past zero forever.
    fn spawn_upcoming_poll(&self, starts_at: DateTime<Utc>) {
        let controller = self.clone();
        let task = tokio::spawn(async move {
            let until_start = (starts_at - Utc::now()).num_milliseconds().max(0) as u64;
            let scheduled_start = tokio::time::Instant::now() + Duration::from_millis(until_start);

            loop {
                tokio::time::sleep(UPCOMING_POLL_INTERVAL).await;

                if !matches!(controller.state(), WatchState::Upcoming { .. }) {
                    break;
                }

                let response = match controller
                    .inner
                    .api
                    .check_access(controller.inner.event_id)
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::debug!(error = %e, "Upcoming poll failed, will retry");
                        continue;
                    }
                };

                if let Some(event) = response.event {
                    match event.status {
                        EventStatus::Upcoming => {
                            if tokio::time::Instant::now() >= scheduled_start {
                                controller.inner.set_state(WatchState::Expired);
                                break;
                            }
                        }
                        EventStatus::Live => {
                            controller.inner.set_state(WatchState::Ready);
                            break;
                        }
                        EventStatus::Ended => {
                            controller.inner.set_state(WatchState::Expired);
                            break;
                        }
                    }
                }
            }
        });

        *self.inner.poll_task.lock() = Some(task);
    }

    /// Heartbeat at the server-dictated cadence until the session ends.
    fn spawn_heartbeat_loop(&self) {
        let controller = self.clone();
        let task = tokio::spawn(async move {
            loop {
                let interval_ms = *controller.inner.heartbeat_interval_ms.lock();
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;

                if !matches!(controller.state(), WatchState::Active) {
                    break;
                }

                let position = *controller.inner.playback.lock();
                let result = controller
                    .inner
                    .api
                    .heartbeat(
                        controller.inner.event_id,
                        controller.inner.device_id,
                        Some(position),
                    )
                    .await;

                match result {
                    Ok(snapshot) => {
                        if !snapshot.session_active {
                            // Budget crossed zero mid-watch
                            controller.inner.set_state(WatchState::TimeLimitReached {
                                message: ControllerInner::<A>::exhausted_message(&snapshot),
                            });
                            break;
                        }
                        controller.inner.apply_snapshot(&snapshot);
                    }
                    Err(e) if e.is_terminal() => {
                        controller.inner.apply_terminal_error(&e);
                        break;
                    }
                    Err(e) => {
                        // One automatic re-admission; a second transient
                        // failure gives up
                        if controller.inner.restarted.swap(true, Ordering::SeqCst) {
                            controller.inner.set_state(WatchState::Failed {
                                message: e.to_string(),
                            });
                            break;
                        }

                        tracing::warn!(error = %e, "Heartbeat failed, re-admitting once");
                        match controller
                            .inner
                            .api
                            .start_session(controller.inner.event_id, controller.inner.device_id)
                            .await
                        {
                            Ok(snapshot) => controller.inner.apply_snapshot(&snapshot),
                            Err(e) if e.is_terminal() => {
                                controller.inner.apply_terminal_error(&e);
                                break;
                            }
                            Err(e) => {
                                controller.inner.set_state(WatchState::Failed {
                                    message: e.to_string(),
                                });
                                break;
                            }
                        }
                    }
                }
            }
        });

        *self.inner.heartbeat_task.lock() = Some(task);
    }
}
