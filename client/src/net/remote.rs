//! Remote participants and their smoothing toward the last received state.

use std::time::Instant;

use walkabout_shared::look::wrap_angle;
use walkabout_shared::protocol::{PlayerId, PlayerStateWire};

/// Pose of a remote player: foot position plus look angles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
    pub pitch: f64,
}

impl From<PlayerStateWire> for RemoteSnapshot {
    fn from(s: PlayerStateWire) -> Self {
        Self {
            x: s.x,
            y: s.y,
            z: s.z,
            yaw: s.yaw,
            pitch: s.pitch,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemotePlayer {
    pub id: PlayerId,
    pub display_name: String,
    /// What the presentation layer draws this frame
    pub rendered: RemoteSnapshot,
    /// Last state received from the server
    pub target: RemoteSnapshot,
    /// When the target last changed (or the player appeared)
    pub last_update: Instant,
    /// No state received yet; the first one is taken as-is.
    placeholder: bool,
}

impl RemotePlayer {
    /// New player at rest. Without a known state it stands at the origin
    /// until the first state arrives.
    pub fn new(id: PlayerId, display_name: String, state: Option<PlayerStateWire>) -> Self {
        let snapshot = state.map(RemoteSnapshot::from).unwrap_or_default();
        Self {
            id,
            display_name,
            rendered: snapshot,
            target: snapshot,
            last_update: Instant::now(),
            placeholder: state.is_none(),
        }
    }

    /// Only the target moves; the rendered pose catches up in `interpolate`.
    /// A player still at its placeholder pose jumps straight to the first state.
    pub fn set_target(&mut self, state: PlayerStateWire) {
        self.target = state.into();
        if self.placeholder {
            self.rendered = self.target;
            self.placeholder = false;
        }
        self.last_update = Instant::now();
    }

    /// Exponential smoothing toward the target. Yaw takes the short way round.
    pub fn interpolate(&mut self, dt: f64, gain: f64) {
        let t = smoothing_factor(dt, gain);
        let r = &mut self.rendered;
        let g = &self.target;

        r.x += (g.x - r.x) * t;
        r.y += (g.y - r.y) * t;
        r.z += (g.z - r.z) * t;
        r.pitch += (g.pitch - r.pitch) * t;
        r.yaw = wrap_angle(r.yaw + wrap_angle(g.yaw - r.yaw) * t);
    }
}

/// `min(1, dt * k)`, with negative or non-finite `dt` treated as no time.
pub fn smoothing_factor(dt: f64, gain: f64) -> f64 {
    if !dt.is_finite() || dt <= 0.0 {
        return 0.0;
    }
    (dt * gain).min(1.0)
}
