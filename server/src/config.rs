use std::time::Duration;

use walkabout_shared::config::ConfigError;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Fan-out buffer per receiver before the slowest one starts losing events
    pub broadcast_capacity: usize,
    pub command_capacity: usize,
    /// Frames above this size close the connection
    pub max_message_bytes: usize,
    /// Unparseable frames tolerated before the connection is closed
    pub max_parse_errors: u32,
    /// Evict players silent for this long. `None` keeps them until disconnect.
    pub stale_after_secs: Option<f64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            broadcast_capacity: 256,
            command_capacity: 256,
            max_message_bytes: 4096,
            max_parse_errors: 5,
            stale_after_secs: None,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `WALKABOUT_LISTEN_ADDR` (or `PORT`) and
    /// `WALKABOUT_STALE_AFTER_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("WALKABOUT_LISTEN_ADDR") {
            config.listen_addr = addr;
        } else if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port.parse().map_err(|_| ConfigError::Invalid {
                field: "PORT",
                reason: format!("not a port number: {port}"),
            })?;
            config.listen_addr = format!("0.0.0.0:{port}");
        }

        if let Ok(secs) = std::env::var("WALKABOUT_STALE_AFTER_SECS") {
            let secs: f64 = secs.parse().map_err(|_| ConfigError::Invalid {
                field: "WALKABOUT_STALE_AFTER_SECS",
                reason: format!("not a number: {secs}"),
            })?;
            config.stale_after_secs = Some(secs);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.is_empty() {
            return Err(ConfigError::Invalid {
                field: "listen_addr",
                reason: "must not be empty".to_string(),
            });
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::NotPositive {
                field: "broadcast_capacity",
            });
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::NotPositive {
                field: "command_capacity",
            });
        }
        if self.max_message_bytes == 0 {
            return Err(ConfigError::NotPositive {
                field: "max_message_bytes",
            });
        }
        if let Some(secs) = self.stale_after_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::NotPositive {
                    field: "stale_after_secs",
                });
            }
        }
        Ok(())
    }

    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after_secs.map(Duration::from_secs_f64)
    }
}
