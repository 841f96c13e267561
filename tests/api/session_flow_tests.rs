//! Client Session Flow Tests
//!
//! End-to-end controller flows against a scripted API: the full
//! watch lifecycle, the terminal admission outcomes, and playback
//! reconciliation across heartbeats.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use stream_gate::client::device::FixedDeviceIdentity;
use stream_gate::client::{ApiError, SessionController, ViewerContext, WatchState};
use uuid::Uuid;

use crate::common::{
    active_snapshot, denied_access, exhausted_snapshot, granted_access, upcoming_access,
    ScriptedApi, EVENT_ID,
};

fn controller(api: Arc<ScriptedApi>, device_id: Uuid) -> SessionController<ScriptedApi> {
    SessionController::new(
        api,
        &FixedDeviceIdentity(device_id),
        ViewerContext::new(7),
        EVENT_ID,
    )
}

#[tokio::test(start_paused = true)]
async fn full_watch_lifecycle() {
    let device_id = Uuid::new_v4();
    let api = Arc::new(ScriptedApi::new());
    api.script_access(Ok(granted_access()));
    api.script_start(Ok(active_snapshot(1000, 0.0)));
    api.script_heartbeat(Ok(active_snapshot(1000, 30.0)));

    let ctrl = controller(api.clone(), device_id);

    assert_eq!(ctrl.init().await, WatchState::Ready);
    assert_eq!(ctrl.start().await, WatchState::Active);

    ctrl.set_position(29.0);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(ctrl.state(), WatchState::Active);

    ctrl.stop().await;
    assert_eq!(ctrl.state(), WatchState::Ended);

    let ended = api.ended.lock();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].0, EVENT_ID);
    assert_eq!(ended[0].1, device_id);
}

#[tokio::test]
async fn viewer_without_ticket_is_denied() {
    let api = Arc::new(ScriptedApi::new());
    api.script_access(Ok(denied_access("NO_TICKET")));

    let ctrl = controller(api, Uuid::new_v4());
    let state = ctrl.init().await;

    assert_eq!(
        state,
        WatchState::AccessDenied {
            reason: "NO_TICKET".into()
        }
    );

    // A denied viewer cannot start a session
    assert!(ctrl.start().await.is_terminal());
}

#[tokio::test]
async fn spent_budget_blocks_admission() {
    let api = Arc::new(ScriptedApi::new());
    api.script_access(Ok(granted_access()));
    api.script_start(Err(ApiError::TimeLimitReached(
        "100% of allowed time used".into(),
    )));

    let ctrl = controller(api, Uuid::new_v4());
    ctrl.init().await;
    let state = ctrl.start().await;

    assert_eq!(
        state,
        WatchState::TimeLimitReached {
            message: "100% of allowed time used".into()
        }
    );
    assert!(state.is_terminal());
}

#[tokio::test]
async fn extra_device_hits_the_ceiling() {
    let api = Arc::new(ScriptedApi::new());
    api.script_access(Ok(granted_access()));
    api.script_start(Err(ApiError::MaxViewersReached(
        "This content can only be viewed on one device at a time.".into(),
    )));

    let ctrl = controller(api, Uuid::new_v4());
    ctrl.init().await;
    let state = ctrl.start().await;

    assert!(matches!(state, WatchState::MaxViewersReached { .. }));
}

#[tokio::test(start_paused = true)]
async fn budget_exhaustion_midstream_ends_the_session() {
    let api = Arc::new(ScriptedApi::new());
    api.script_access(Ok(granted_access()));
    api.script_start(Ok(active_snapshot(1000, 0.0)));
    api.script_heartbeat(Ok(exhausted_snapshot()));

    let ctrl = controller(api, Uuid::new_v4());
    ctrl.init().await;
    ctrl.start().await;

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(
        ctrl.state(),
        WatchState::TimeLimitReached {
            message: "100% of allowed time used".into()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn upcoming_event_goes_ready_once_live() {
    let api = Arc::new(ScriptedApi::new());
    api.script_access(Ok(upcoming_access(120)));
    api.script_access(Ok(granted_access()));

    let ctrl = controller(api, Uuid::new_v4());
    let state = ctrl.init().await;
    assert!(matches!(state, WatchState::Upcoming { .. }));

    // The next scheduled poll picks up the live status
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(ctrl.state(), WatchState::Ready);
}

#[tokio::test(start_paused = true)]
async fn upcoming_event_that_never_goes_live_expires() {
    let api = Arc::new(ScriptedApi::new());
    // The scheduled start passes while every check still reports upcoming
    api.script_access(Ok(upcoming_access(10)));
    api.script_access(Ok(upcoming_access(10)));

    let ctrl = controller(api, Uuid::new_v4());
    ctrl.init().await;

    tokio::time::sleep(Duration::from_secs(300)).await;

    assert_eq!(ctrl.state(), WatchState::Expired);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_the_heartbeat_timer() {
    let api = Arc::new(ScriptedApi::new());
    api.script_access(Ok(granted_access()));
    api.script_start(Ok(active_snapshot(1000, 0.0)));
    // No heartbeats scripted: a tick after stop would pop an unscripted
    // result and drive the controller out of Ended

    let ctrl = controller(api.clone(), Uuid::new_v4());
    ctrl.init().await;
    ctrl.start().await;
    ctrl.stop().await;
    assert_eq!(ctrl.state(), WatchState::Ended);

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(ctrl.state(), WatchState::Ended);
    assert_eq!(api.ended.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_snaps_drifted_playback() {
    let api = Arc::new(ScriptedApi::new());
    api.script_access(Ok(granted_access()));
    api.script_start(Ok(active_snapshot(1000, 0.0)));
    api.script_heartbeat(Ok(active_snapshot(1000, 120.0)));

    let ctrl = controller(api, Uuid::new_v4());
    ctrl.init().await;
    ctrl.start().await;
    ctrl.set_position(100.0);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(ctrl.position(), 120.0);
    ctrl.stop().await;
}
