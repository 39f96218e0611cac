//! Camera orientation as yaw/pitch.
//!
//! Convention: forward is -Z at yaw 0, yaw turns counter-clockwise seen from
//! above (toward -X), pitch is positive looking up. Yaw is taken from the
//! horizontal part of the look direction only, so pitching never leaks into it.

use std::f64::consts::{PI, TAU};

use crate::vec3::{vec3, Vec3};

/// Pitch stays just short of straight up/down so yaw stays defined.
pub const MAX_PITCH: f64 = PI / 2.0 - 1e-3;

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Look {
    pub yaw: f64,
    pub pitch: f64,
}

impl Look {
    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self {
            yaw: wrap_angle(yaw),
            pitch: pitch.clamp(-MAX_PITCH, MAX_PITCH),
        }
    }

    /// Decompose a look direction (YXZ order): yaw from the XZ projection,
    /// then pitch from the vertical component.
    pub fn from_direction(dir: Vec3) -> Self {
        let len = (dir.x * dir.x + dir.y * dir.y + dir.z * dir.z).sqrt();
        if len < 1e-10 {
            return Self::default();
        }
        let yaw = (-dir.x).atan2(-dir.z);
        let pitch = (dir.y / len).clamp(-1.0, 1.0).asin();
        Self { yaw, pitch }
    }

    /// Unit look direction.
    pub fn direction(&self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        vec3(
            -self.yaw.sin() * cos_pitch,
            self.pitch.sin(),
            -self.yaw.cos() * cos_pitch,
        )
    }

    /// Horizontal forward, independent of pitch.
    pub fn forward_flat(&self) -> Vec3 {
        vec3(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Horizontal right (forward x up).
    pub fn right_flat(&self) -> Vec3 {
        vec3(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    pub fn turned(&self, delta_yaw: f64, delta_pitch: f64) -> Self {
        Self::new(self.yaw + delta_yaw, self.pitch + delta_pitch)
    }
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(a: f64) -> f64 {
    let wrapped = (a + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}
