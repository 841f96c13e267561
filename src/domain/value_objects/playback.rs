//! Playback position value object.
//!
//! The position is authoritative on the server and advisory on clients.
//! Clients only snap to it when local drift exceeds a tolerance window,
//! so natural playback jitter is never fought.

use serde::{Deserialize, Serialize};

/// Offset into a live event's stream, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PlaybackPosition(pub f64);

impl PlaybackPosition {
    pub fn new(seconds: f64) -> Self {
        Self(seconds.max(0.0))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Absolute drift between this position and a local one.
    pub fn drift_from(&self, local_seconds: f64) -> f64 {
        (self.0 - local_seconds).abs()
    }

    /// Whether a client at `local_seconds` should snap to this position.
    pub fn needs_resync(&self, local_seconds: f64, threshold_secs: f64) -> bool {
        self.drift_from(local_seconds) > threshold_secs
    }
}

impl From<f64> for PlaybackPosition {
    fn from(seconds: f64) -> Self {
        Self::new(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_at_threshold_does_not_resync() {
        let pos = PlaybackPosition::new(100.0);
        assert!(!pos.needs_resync(97.0, 3.0));
        assert!(!pos.needs_resync(103.0, 3.0));
    }

    #[test]
    fn drift_beyond_threshold_resyncs_either_direction() {
        let pos = PlaybackPosition::new(100.0);
        assert!(pos.needs_resync(96.5, 3.0));
        assert!(pos.needs_resync(103.5, 3.0));
    }

    #[test]
    fn negative_positions_clamp_to_zero() {
        assert_eq!(PlaybackPosition::new(-4.2).seconds(), 0.0);
    }
}
