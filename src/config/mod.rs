//! Configuration module - environment variable parsing

mod game;

pub use game::GameConfig;

use std::env;
use std::str::FromStr;

/// Client runtime configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Frame loop rate in Hz
    pub frame_rate: u32,
    /// Minimum interval between outbound player-state snapshots
    pub state_send_interval_ms: u64,
    /// Wait before asking the transport to reconnect after death
    pub reconnect_backoff_ms: u64,
    /// Seed for the session RNG (wall clock when unset)
    pub rng_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            frame_rate: parse_or("FRAME_RATE", 60)?,
            state_send_interval_ms: parse_or("STATE_SEND_INTERVAL_MS", 50)?,
            reconnect_backoff_ms: parse_or("RECONNECT_BACKOFF_MS", 1000)?,
            rng_seed: match env::var("RNG_SEED") {
                Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid("RNG_SEED"))?),
                Err(_) => None,
            },
        })
    }

    /// Seconds per frame at the configured rate
    pub fn frame_delta(&self) -> f64 {
        1.0 / self.frame_rate.max(1) as f64
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_rate: 60,
            state_send_interval_ms: 50,
            reconnect_backoff_ms: 1000,
            rng_seed: None,
        }
    }
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
