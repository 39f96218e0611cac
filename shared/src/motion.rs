//! Local player motion: walking, gravity and jumping.

use crate::collision::{self, Cylinder};
use crate::config::MotionConfig;
use crate::look::Look;
use crate::vec3::{self, Vec3};
use crate::world::Obstacle;

/// Movement intents for one tick, as delivered by the input layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intents {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    /// Edge-triggered: consumed by the tick that sees it.
    pub jump: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Grounded,
    Airborne,
}

/// Local player kinematic state. `position.y` is the foot height.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    config: MotionConfig,
    pub position: Vec3,
    pub velocity_y: f64,
    pub stance: Stance,
}

impl Motion {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            position: Vec3::new(config.spawn_x, 0.0, config.spawn_z),
            velocity_y: 0.0,
            stance: Stance::Grounded,
            config,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn foot_height(&self) -> f64 {
        self.position.y
    }

    /// Height the presentation layer should put the camera at.
    pub fn camera_height(&self) -> f64 {
        self.config.eye_height + self.position.y
    }

    pub fn body(&self) -> Cylinder {
        Cylinder {
            radius: self.config.radius,
            height: self.config.eye_height,
        }
    }

    pub fn speed(&self, sprint: bool) -> f64 {
        if sprint {
            self.config.base_speed * self.config.sprint_multiplier
        } else {
            self.config.base_speed
        }
    }

    /// Horizontal displacement for one tick: unit direction from the summed
    /// intents, scaled by speed. Diagonals are no faster than straight lines.
    pub fn horizontal_step(&self, intents: &Intents, look: &Look, dt: f64) -> Vec3 {
        let forward = look.forward_flat();
        let right = look.right_flat();

        let mut wish = Vec3::ZERO;
        if intents.forward {
            wish = vec3::add(wish, forward);
        }
        if intents.backward {
            wish = vec3::sub(wish, forward);
        }
        if intents.right {
            wish = vec3::add(wish, right);
        }
        if intents.left {
            wish = vec3::sub(wish, right);
        }

        if vec3::length_sq(wish) == 0.0 {
            return Vec3::ZERO;
        }
        vec3::scale(vec3::normalize(wish), self.speed(intents.sprint) * dt)
    }

    /// Advance one tick.
    pub fn step(&mut self, dt: f64, intents: &Intents, look: &Look, obstacles: &[Obstacle]) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_dt)
        } else {
            0.0
        };

        if intents.jump && self.stance == Stance::Grounded {
            self.velocity_y = self.config.jump_velocity;
            self.stance = Stance::Airborne;
        }

        let step = self.horizontal_step(intents, look, dt);
        self.position.x += step.x;
        self.position.z += step.z;

        let body = self.body();
        collision::resolve(
            &mut self.position.x,
            &mut self.position.z,
            self.position.y,
            body,
            obstacles,
        );

        self.velocity_y -= self.config.gravity * dt;
        self.position.y += self.velocity_y * dt;

        if self.position.y <= 0.0 {
            self.position.y = 0.0;
            self.velocity_y = 0.0;
            self.stance = Stance::Grounded;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3::{horizontal_length, vec3};
    use crate::world::ObstacleKind;
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    fn walker() -> Motion {
        Motion::new(MotionConfig::default())
    }

    #[test]
    fn spawns_grounded_at_configured_point() {
        let m = walker();
        assert_eq!(m.position, vec3(0.0, 0.0, 10.0));
        assert_eq!(m.stance, Stance::Grounded);
        assert!((m.camera_height() - 1.7).abs() < 1e-12);
    }

    #[test]
    fn diagonal_is_not_faster() {
        let m = walker();
        let look = Look::new(0.3, 0.0);
        let straight = Intents {
            forward: true,
            ..Default::default()
        };
        let diagonal = Intents {
            forward: true,
            right: true,
            ..Default::default()
        };
        let a = horizontal_length(m.horizontal_step(&straight, &look, DT));
        let b = horizontal_length(m.horizontal_step(&diagonal, &look, DT));
        assert!((a - b).abs() < 1e-12);
        assert!((a - 4.5 * DT).abs() < 1e-12);
    }

    #[test]
    fn sprint_multiplies_speed() {
        let m = walker();
        let intents = Intents {
            forward: true,
            sprint: true,
            ..Default::default()
        };
        let d = horizontal_length(m.horizontal_step(&intents, &Look::default(), DT));
        assert!((d - 4.5 * 1.6 * DT).abs() < 1e-12);
    }

    #[test]
    fn opposing_intents_cancel() {
        let m = walker();
        let intents = Intents {
            forward: true,
            backward: true,
            ..Default::default()
        };
        assert_eq!(m.horizontal_step(&intents, &Look::default(), DT), Vec3::ZERO);
    }

    #[test]
    fn forward_follows_yaw_only() {
        let mut m = walker();
        let intents = Intents {
            forward: true,
            ..Default::default()
        };
        // Looking steeply down must not slow walking.
        m.step(DT, &intents, &Look::new(0.0, -1.3), &[]);
        assert!((m.position.z - (10.0 - 4.5 * DT)).abs() < 1e-12);
        assert!(m.position.x.abs() < 1e-12);
    }

    #[test]
    fn dt_is_clamped() {
        let mut m = walker();
        let intents = Intents {
            forward: true,
            ..Default::default()
        };
        m.step(1.0, &intents, &Look::default(), &[]);
        assert!((m.position.z - (10.0 - 4.5 * 0.05)).abs() < 1e-12);

        let before = m.position;
        m.step(f64::NAN, &intents, &Look::default(), &[]);
        assert_eq!(m.position, before);
    }

    #[test]
    fn jump_rises_then_lands_with_zero_velocity() {
        let mut m = walker();
        let look = Look::default();
        let jump = Intents {
            jump: true,
            ..Default::default()
        };
        m.step(DT, &jump, &look, &[]);
        assert_eq!(m.stance, Stance::Airborne);
        assert!(m.foot_height() > 0.0);

        let mut peak: f64 = 0.0;
        let mut ticks = 0;
        while m.stance == Stance::Airborne {
            m.step(DT, &Intents::default(), &look, &[]);
            assert!(m.foot_height() >= 0.0);
            peak = peak.max(m.foot_height());
            ticks += 1;
            assert!(ticks < 1000, "never landed");
        }
        assert_eq!(m.foot_height(), 0.0);
        assert_eq!(m.velocity_y, 0.0);
        // v^2 / 2g = 8.5^2 / 36 ~ 2.0 m
        assert!(peak > 1.8 && peak < 2.1, "peak {peak}");
    }

    #[test]
    fn jump_ignored_while_airborne() {
        let mut m = walker();
        let look = Look::default();
        let jump = Intents {
            jump: true,
            ..Default::default()
        };
        m.step(DT, &jump, &look, &[]);
        let v = m.velocity_y;
        m.step(DT, &jump, &look, &[]);
        assert!(m.velocity_y < v, "second jump must not re-apply the impulse");
    }

    #[test]
    fn standing_still_stays_grounded() {
        let mut m = walker();
        for _ in 0..10 {
            m.step(DT, &Intents::default(), &Look::default(), &[]);
            assert_eq!(m.foot_height(), 0.0);
            assert_eq!(m.velocity_y, 0.0);
            assert_eq!(m.stance, Stance::Grounded);
        }
    }

    #[test]
    fn walking_into_a_wall_stops_at_radius() {
        let wall = Obstacle {
            min: vec3(-5.0, 0.0, 7.0),
            max: vec3(5.0, 3.0, 8.0),
            kind: ObstacleKind::Block,
        };
        let mut m = walker();
        let intents = Intents {
            forward: true,
            ..Default::default()
        };
        for _ in 0..200 {
            m.step(DT, &intents, &Look::default(), &[wall]);
        }
        assert!((m.position.z - 8.4).abs() < 1e-9, "z = {}", m.position.z);
    }

    #[test]
    fn jumping_clears_a_low_block() {
        let low = Obstacle {
            min: vec3(-5.0, 0.0, 7.0),
            max: vec3(5.0, 0.5, 8.0),
            kind: ObstacleKind::Block,
        };
        let mut m = walker();
        let look = Look::default();
        m.step(
            DT,
            &Intents {
                jump: true,
                ..Default::default()
            },
            &look,
            &[low],
        );
        let walk = Intents {
            forward: true,
            ..Default::default()
        };
        for _ in 0..60 {
            m.step(DT, &walk, &look, &[low]);
        }
        assert!(m.position.z < 7.0, "z = {}", m.position.z);
    }

    proptest! {
        #[test]
        fn any_intent_combo_is_bounded_by_speed(
            f in any::<bool>(), b in any::<bool>(), l in any::<bool>(), r in any::<bool>(),
            sprint in any::<bool>(), yaw in -7.0f64..7.0,
        ) {
            let m = walker();
            let intents = Intents { forward: f, backward: b, left: l, right: r, sprint, jump: false };
            let d = horizontal_length(m.horizontal_step(&intents, &Look::new(yaw, 0.0), DT));
            prop_assert!(d <= m.speed(sprint) * DT + 1e-12);
        }

        #[test]
        fn foot_height_never_negative(
            dts in proptest::collection::vec(0.0f64..0.2, 1..200),
            jumps in proptest::collection::vec(any::<bool>(), 200),
        ) {
            let mut m = walker();
            for (i, dt) in dts.iter().enumerate() {
                let intents = Intents { jump: jumps[i], ..Default::default() };
                m.step(*dt, &intents, &Look::default(), &[]);
                prop_assert!(m.foot_height() >= 0.0);
            }
        }
    }
}
