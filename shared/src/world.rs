//! Deterministic procedural world.
//!
//! The static world is never transmitted. Every client regenerates it from
//! the shared [`WorldConfig`], so generation must be a pure function of the
//! config: same seed and parameters, same obstacles in the same order.

use std::f64::consts::TAU;

use crate::config::WorldConfig;
use crate::rng::WorldRng;
use crate::vec3::{self, vec3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObstacleKind {
    Block,
    Monument,
}

/// World-space axis-aligned box. Immutable once generated.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Obstacle {
    pub min: Vec3,
    pub max: Vec3,
    pub kind: ObstacleKind,
}

impl Obstacle {
    /// Box of the given size standing on the ground plane, centred at (x, z).
    pub fn grounded(x: f64, z: f64, size: Vec3, kind: ObstacleKind) -> Self {
        let half_x = size.x / 2.0;
        let half_z = size.z / 2.0;
        Self {
            min: vec3(x - half_x, 0.0, z - half_z),
            max: vec3(x + half_x, size.y, z + half_z),
            kind,
        }
    }

    pub fn center(&self) -> Vec3 {
        vec3::scale(vec3::add(self.min, self.max), 0.5)
    }

    pub fn size(&self) -> Vec3 {
        vec3::sub(self.max, self.min)
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Generated static geometry plus its overall bound.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    obstacles: Vec<Obstacle>,
    bounds_min: Vec3,
    bounds_max: Vec3,
}

impl World {
    pub fn generate(config: &WorldConfig) -> Self {
        let mut rng = WorldRng::new(config.seed);
        let mut obstacles = Vec::with_capacity(config.block_count + config.monument_count);

        let mut placed = 0;
        while placed < config.block_count {
            let size = vec3(
                rng.range(config.block_width.min, config.block_width.max),
                rng.range(config.block_height.min, config.block_height.max),
                rng.range(config.block_depth.min, config.block_depth.max),
            );
            let x = rng.range(-config.spread, config.spread);
            let z = rng.range(-config.spread, config.spread);

            // Keep the spawn area clear. The slot is retried, the draws are spent.
            if x * x + z * z < config.clearance_radius * config.clearance_radius {
                continue;
            }

            obstacles.push(Obstacle::grounded(x, z, size, ObstacleKind::Block));
            placed += 1;
        }

        for i in 0..config.monument_count {
            let height = config.monument_base_height + i as f64 * config.monument_height_step;
            let angle = (i as f64 / config.monument_count as f64) * TAU;
            // Platform libm trig may differ in the last ulp; monuments must not.
            let x = libm::cos(angle) * config.monument_ring_radius;
            let z = libm::sin(angle) * config.monument_ring_radius;
            let size = vec3(config.monument_footprint, height, config.monument_footprint);
            obstacles.push(Obstacle::grounded(x, z, size, ObstacleKind::Monument));
        }

        let (bounds_min, bounds_max) = match obstacles.first() {
            Some(first) => obstacles
                .iter()
                .fold((first.min, first.max), |(lo, hi), o| {
                    (vec3::min(lo, o.min), vec3::max(hi, o.max))
                }),
            None => (Vec3::ZERO, Vec3::ZERO),
        };

        Self {
            obstacles,
            bounds_min,
            bounds_max,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Union of every obstacle's box
    pub fn bounds(&self) -> (Vec3, Vec3) {
        (self.bounds_min, self.bounds_max)
    }
}
