//! Playback Reconciliation
//!
//! Authoritative playback positions reach the client on two paths: the
//! heartbeat response and the sync socket. Both collapse into one update
//! type and one reconciliation rule, so neither path can drift from the
//! other.

use crate::domain::value_objects::PlaybackPosition;

/// An authoritative playback position, tagged with the path it arrived on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncUpdate {
    /// Position carried in a heartbeat response.
    Heartbeat { position: f64 },

    /// Position pushed over the sync socket.
    Socket { position: f64 },
}

impl SyncUpdate {
    pub fn position(&self) -> f64 {
        match *self {
            SyncUpdate::Heartbeat { position } => position,
            SyncUpdate::Socket { position } => position,
        }
    }
}

/// Decide whether the local player should snap to the authoritative
/// position.
///
/// Returns the position to seek to when local playback has drifted
/// strictly beyond the threshold, `None` otherwise. While the viewer is
/// scrubbing, reconciliation is suppressed entirely; the next heartbeat
/// report makes the new position authoritative instead.
pub fn reconcile(
    local: PlaybackPosition,
    update: SyncUpdate,
    threshold_secs: f64,
    is_seeking: bool,
) -> Option<f64> {
    if is_seeking {
        return None;
    }

    let authoritative = PlaybackPosition::new(update.position());
    if authoritative.needs_resync(local.seconds(), threshold_secs) {
        Some(authoritative.0)
    } else {
        None
    }
}
