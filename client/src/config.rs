use walkabout_shared::config::{ConfigError, MotionConfig, WorldConfig};

pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:3000/ws";

/// Local state is sent at most this often.
pub const SEND_INTERVAL: f64 = 1.0 / 15.0;

/// Gain `k` of the remote-player smoothing factor `min(1, dt * k)`.
pub const INTERPOLATION_GAIN: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ws_url: String,
    /// Name sent with `join`. `None` lets the server pick one.
    pub display_name: Option<String>,
    pub send_interval: f64,
    pub interpolation_gain: f64,
    pub world: WorldConfig,
    pub motion: MotionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            display_name: None,
            send_interval: SEND_INTERVAL,
            interpolation_gain: INTERPOLATION_GAIN,
            world: WorldConfig::default(),
            motion: MotionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `WALKABOUT_WS_URL`, `WALKABOUT_NAME` and
    /// `WALKABOUT_WORLD_SEED`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("WALKABOUT_WS_URL") {
            config.ws_url = url;
        }
        if let Ok(name) = std::env::var("WALKABOUT_NAME") {
            config.display_name = Some(name).filter(|n| !n.is_empty());
        }
        if let Ok(seed) = std::env::var("WALKABOUT_WORLD_SEED") {
            config.world.seed = seed.parse().map_err(|_| ConfigError::Invalid {
                field: "WALKABOUT_WORLD_SEED",
                reason: format!("not an unsigned integer: {seed}"),
            })?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.ws_url).map_err(|e| ConfigError::Invalid {
            field: "ws_url",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid {
                field: "ws_url",
                reason: format!("expected ws:// or wss://, got {}://", parsed.scheme()),
            });
        }
        if !self.send_interval.is_finite() || self.send_interval <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "send_interval",
            });
        }
        if !self.interpolation_gain.is_finite() || self.interpolation_gain <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "interpolation_gain",
            });
        }
        self.world.validate()?;
        self.motion.validate()?;
        Ok(())
    }
}
