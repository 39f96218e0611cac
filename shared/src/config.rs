use thiserror::Error;

/// Seed every client uses unless told otherwise. All participants must agree
/// on it, since the world itself is never sent over the wire.
pub const DEFAULT_WORLD_SEED: u64 = 20250815;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite and > 0")]
    NotPositive { field: &'static str },
    #[error("{field} must be finite and >= 0")]
    Negative { field: &'static str },
    #[error("{field} range is empty or inverted: [{min}, {max})")]
    BadRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A half-open real interval `[min, max)` drawn from by the world generator.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.max < self.min {
            return Err(ConfigError::BadRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Parameters of the procedural world. Two clients with equal configs
/// generate bit-identical obstacle lists.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldConfig {
    pub seed: u64,
    /// Number of randomized blocks
    pub block_count: usize,
    pub block_width: Span,
    pub block_height: Span,
    pub block_depth: Span,
    /// Blocks are centred in `[-spread, spread)` on both X and Z
    pub spread: f64,
    /// Blocks centred closer than this to the origin are re-sampled
    pub clearance_radius: f64,
    pub monument_count: usize,
    pub monument_ring_radius: f64,
    pub monument_footprint: f64,
    pub monument_base_height: f64,
    pub monument_height_step: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_WORLD_SEED,
            block_count: 50,
            block_width: Span::new(1.5, 4.5),
            block_height: Span::new(2.0, 5.0),
            block_depth: Span::new(1.5, 4.5),
            spread: 160.0,
            clearance_radius: 8.0,
            monument_count: 6,
            monument_ring_radius: 60.0,
            monument_footprint: 3.0,
            monument_base_height: 12.0,
            monument_height_step: 6.0,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.block_width.check("block_width")?;
        self.block_height.check("block_height")?;
        self.block_depth.check("block_depth")?;
        if !self.spread.is_finite() || self.spread <= 0.0 {
            return Err(ConfigError::NotPositive { field: "spread" });
        }
        if !self.clearance_radius.is_finite() || self.clearance_radius < 0.0 {
            return Err(ConfigError::Negative {
                field: "clearance_radius",
            });
        }
        // The square [-spread, spread)^2 must leave room outside the clearance
        // circle, or the rejection loop never finishes.
        if self.block_count > 0 && self.clearance_radius >= self.spread * std::f64::consts::SQRT_2
        {
            return Err(ConfigError::Invalid {
                field: "clearance_radius",
                reason: "clearance circle covers the whole placement square".to_string(),
            });
        }
        if !self.monument_ring_radius.is_finite() || self.monument_ring_radius < 0.0 {
            return Err(ConfigError::Negative {
                field: "monument_ring_radius",
            });
        }
        if !self.monument_footprint.is_finite() || self.monument_footprint <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "monument_footprint",
            });
        }
        if !self.monument_base_height.is_finite() || self.monument_base_height <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "monument_base_height",
            });
        }
        if !self.monument_height_step.is_finite() || self.monument_height_step < 0.0 {
            return Err(ConfigError::Negative {
                field: "monument_height_step",
            });
        }
        Ok(())
    }
}

/// Local player physics constants
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionConfig {
    /// Camera height above the feet; also the height of the collision cylinder
    pub eye_height: f64,
    /// Horizontal collision radius
    pub radius: f64,
    /// m/s^2, pulling toward the ground plane
    pub gravity: f64,
    /// m/s
    pub base_speed: f64,
    pub sprint_multiplier: f64,
    /// Upward velocity set by a jump (m/s)
    pub jump_velocity: f64,
    /// Upper bound on a single tick's elapsed time (seconds)
    pub max_dt: f64,
    pub spawn_x: f64,
    pub spawn_z: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            eye_height: 1.7,
            radius: 0.4,
            gravity: 18.0,
            base_speed: 4.5,
            sprint_multiplier: 1.6,
            jump_velocity: 8.5,
            max_dt: 0.05,
            spawn_x: 0.0,
            spawn_z: 10.0,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("eye_height", self.eye_height),
            ("radius", self.radius),
            ("gravity", self.gravity),
            ("base_speed", self.base_speed),
            ("sprint_multiplier", self.sprint_multiplier),
            ("jump_velocity", self.jump_velocity),
            ("max_dt", self.max_dt),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field });
            }
        }
        if !self.spawn_x.is_finite() || !self.spawn_z.is_finite() {
            return Err(ConfigError::Invalid {
                field: "spawn",
                reason: "spawn position must be finite".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_world_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn default_motion_config_is_valid() {
        assert!(MotionConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_block_range_invalid() {
        let config = WorldConfig {
            block_height: Span::new(5.0, 2.0),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BadRange {
                field: "block_height",
                min: 5.0,
                max: 2.0
            })
        );
    }

    #[test]
    fn clearance_covering_spread_invalid() {
        let config = WorldConfig {
            spread: 5.0,
            clearance_radius: 8.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_gravity_invalid() {
        let config = MotionConfig {
            gravity: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "gravity" })
        );
    }

    #[test]
    fn world_config_json_is_camel_case() {
        let json = serde_json::to_string(&WorldConfig::default()).unwrap();
        assert!(json.contains("\"blockCount\":50"));
        assert!(json.contains("\"clearanceRadius\":8.0"));
    }
}
