//! Horizontal player-vs-obstacle collision.
//!
//! The player is a vertical cylinder: a circle of `radius` in the XZ plane
//! spanning `[foot_height, foot_height + eye_height]`. Obstacles only push
//! sideways; they never act as floors or ceilings.

use crate::world::Obstacle;

/// Full passes over the obstacle list per tick. A second pass settles most
/// cases where resolving one box pushed the player into another.
pub const RESOLVE_PASSES: usize = 2;

/// Below this distance the displacement direction is meaningless.
const DEGENERATE_DIST: f64 = 1e-5;

/// Collision shape of the local player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    pub radius: f64,
    pub height: f64,
}

/// Push `(x, z)` out of every obstacle the cylinder overlaps, running
/// [`RESOLVE_PASSES`] passes.
pub fn resolve(
    x: &mut f64,
    z: &mut f64,
    foot_height: f64,
    body: Cylinder,
    obstacles: &[Obstacle],
) {
    for _ in 0..RESOLVE_PASSES {
        resolve_pass(x, z, foot_height, body, obstacles);
    }
}

/// One correction pass over the full obstacle list.
pub fn resolve_pass(
    x: &mut f64,
    z: &mut f64,
    foot_height: f64,
    body: Cylinder,
    obstacles: &[Obstacle],
) {
    let bottom = foot_height;
    let top = foot_height + body.height;
    let r = body.radius;

    for b in obstacles {
        if top < b.min.y || bottom > b.max.y {
            continue;
        }

        let closest_x = x.clamp(b.min.x, b.max.x);
        let closest_z = z.clamp(b.min.z, b.max.z);
        let dx = *x - closest_x;
        let dz = *z - closest_z;
        let dist_sq = dx * dx + dz * dz;

        if dist_sq >= r * r {
            continue;
        }

        let dist = dist_sq.sqrt();
        let mut overlap = r - dist;
        let (nx, nz) = if dist < DEGENERATE_DIST {
            // Centre sits on or inside the rectangle: leave through the nearest
            // edge, covering the distance to that edge as well.
            let left = (*x - b.min.x).abs();
            let right = (b.max.x - *x).abs();
            let near = (*z - b.min.z).abs();
            let far = (b.max.z - *z).abs();
            if left.min(right) < near.min(far) {
                overlap += left.min(right);
                (if left < right { -1.0 } else { 1.0 }, 0.0)
            } else {
                overlap += near.min(far);
                (0.0, if near < far { -1.0 } else { 1.0 })
            }
        } else {
            (dx / dist, dz / dist)
        };

        *x += nx * overlap;
        *z += nz * overlap;
    }
}

/// How far the circle reaches into the obstacle's XZ rectangle, or 0 when
/// clear. Vertical overlap is not considered.
pub fn penetration(x: f64, z: f64, radius: f64, obstacle: &Obstacle) -> f64 {
    let inside_x = x > obstacle.min.x && x < obstacle.max.x;
    let inside_z = z > obstacle.min.z && z < obstacle.max.z;
    if inside_x && inside_z {
        let to_edge = (x - obstacle.min.x)
            .min(obstacle.max.x - x)
            .min(z - obstacle.min.z)
            .min(obstacle.max.z - z);
        return radius + to_edge;
    }
    let dx = x - x.clamp(obstacle.min.x, obstacle.max.x);
    let dz = z - z.clamp(obstacle.min.z, obstacle.max.z);
    (radius - dx.hypot(dz)).max(0.0)
}
