//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use truco::room::{
    RoomConfig,
    config::{DEFAULT_BOT_DELAY, DEFAULT_DEALER_DELAY, DEFAULT_GAME_END_DELAY, DEFAULT_ROUND_END_DELAY},
};

pub const DEFAULT_BIND: &str = "127.0.0.1:6969";
pub const DEFAULT_MAX_ROOMS: usize = 1000;

/// Longest pause any room timer may be configured with.
pub const MAX_DELAY: Duration = Duration::from_secs(60);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// HTTP/WebSocket bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; no exporter when `None`
    pub metrics_bind: Option<SocketAddr>,
    /// Room timings
    pub timings: RoomTimings,
    /// Upper bound on concurrently open rooms
    pub max_rooms: usize,
}

/// Pauses every room inherits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomTimings {
    pub bot_delay: Duration,
    pub round_end_delay: Duration,
    pub game_end_delay: Duration,
    pub dealer_delay: Duration,
}

impl Default for RoomTimings {
    fn default() -> Self {
        Self {
            bot_delay: DEFAULT_BOT_DELAY,
            round_end_delay: DEFAULT_ROUND_END_DELAY,
            game_end_delay: DEFAULT_GAME_END_DELAY,
            dealer_delay: DEFAULT_DEALER_DELAY,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 6969)),
            metrics_bind: None,
            timings: RoomTimings::default(),
            max_rooms: DEFAULT_MAX_ROOMS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_override` - Optional metrics address override (from CLI args)
    /// * `bot_delay_override` - Optional bot delay override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_override: Option<SocketAddr>,
        bot_delay_override: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        if let Some(bind) = bind_override {
            config.bind = bind;
        }
        if metrics_override.is_some() {
            config.metrics_bind = metrics_override;
        }
        if let Some(delay) = bot_delay_override {
            config.timings.bot_delay = delay;
        }
        Ok(config)
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a present but unparsable value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let bind = parse_or(&lookup, "SERVER_BIND", defaults.bind)?;
        let metrics_bind = match lookup("METRICS_BIND").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(parse_value("METRICS_BIND", &raw)?),
            None => None,
        };

        let millis = |key: &str, default: Duration| -> Result<Duration, ConfigError> {
            let ms = parse_or(&lookup, key, default.as_millis() as u64)?;
            Ok(Duration::from_millis(ms))
        };
        let timings = RoomTimings {
            bot_delay: millis("BOT_DELAY_MS", defaults.timings.bot_delay)?,
            round_end_delay: millis("ROUND_END_DELAY_MS", defaults.timings.round_end_delay)?,
            game_end_delay: millis("GAME_END_DELAY_MS", defaults.timings.game_end_delay)?,
            dealer_delay: millis("DEALER_DELAY_MS", defaults.timings.dealer_delay)?,
        };

        let max_rooms = parse_or(&lookup, "MAX_ROOMS", defaults.max_rooms)?;

        Ok(Self {
            bind,
            metrics_bind,
            timings,
            max_rooms,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Rejects a zero room limit and any delay above [`MAX_DELAY`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rooms == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_ROOMS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let delays = [
            ("BOT_DELAY_MS", self.timings.bot_delay),
            ("ROUND_END_DELAY_MS", self.timings.round_end_delay),
            ("GAME_END_DELAY_MS", self.timings.game_end_delay),
            ("DEALER_DELAY_MS", self.timings.dealer_delay),
        ];
        for (var, delay) in delays {
            if delay > MAX_DELAY {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("Must be at most {} ms", MAX_DELAY.as_millis()),
                });
            }
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from SERVER_BIND ({})", self.bind),
            });
        }

        Ok(())
    }

    /// Template every new room is created from.
    #[must_use]
    pub fn room_template(&self) -> RoomConfig {
        RoomConfig {
            bot_delay: self.timings.bot_delay,
            round_end_delay: self.timings.round_end_delay,
            game_end_delay: self.timings.game_end_delay,
            dealer_delay: self.timings.dealer_delay,
            ..RoomConfig::default()
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("{raw:?}: {e}"),
    })
}

/// Parse `key` when present, else fall back to `default`.
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_values_are_read() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SERVER_BIND", "0.0.0.0:8080"),
            ("METRICS_BIND", "0.0.0.0:9090"),
            ("BOT_DELAY_MS", "250"),
            ("MAX_ROOMS", "7"),
        ]))
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.metrics_bind.map(|a| a.port()), Some(9090));
        assert_eq!(config.timings.bot_delay, Duration::from_millis(250));
        assert_eq!(config.timings.dealer_delay, DEFAULT_DEALER_DELAY);
        assert_eq!(config.max_rooms, 7);
    }

    #[test]
    fn test_blank_metrics_bind_disables_exporter() {
        let config = ServerConfig::from_lookup(lookup(&[("METRICS_BIND", " ")])).unwrap();
        assert_eq!(config.metrics_bind, None);
    }

    #[test]
    fn test_garbage_is_reported_not_ignored() {
        let err = ServerConfig::from_lookup(lookup(&[("BOT_DELAY_MS", "soon")])).unwrap_err();
        let ConfigError::Invalid { var, .. } = err;
        assert_eq!(var, "BOT_DELAY_MS");
    }

    #[test]
    fn test_config_validation_zero_rooms() {
        let config = ServerConfig {
            max_rooms: 0,
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MAX_ROOMS"));
    }

    #[test]
    fn test_config_validation_delay_too_long() {
        let mut config = ServerConfig::default();
        config.timings.game_end_delay = Duration::from_secs(61);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GAME_END_DELAY_MS"));

        config.timings.game_end_delay = MAX_DELAY;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metrics_cannot_share_the_server_port() {
        let config = ServerConfig {
            metrics_bind: Some(ServerConfig::default().bind),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_room_template_carries_timings() {
        let mut config = ServerConfig::default();
        config.timings.bot_delay = Duration::from_millis(10);
        let template = config.room_template();
        assert_eq!(template.bot_delay, Duration::from_millis(10));
        assert_eq!(template.round_end_delay, DEFAULT_ROUND_END_DELAY);
        assert_eq!(template.seed, None);
    }
}
