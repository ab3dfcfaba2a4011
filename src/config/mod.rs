//! Configuration module - environment variable parsing

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::game::SpawnBounds;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origin for CORS (`*` or comma-separated list)
    pub client_origin: String,
    /// Round constants handed to every session
    pub round: RoundConfig,
}

/// Tunables of a single round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Milliseconds between spawn ticks
    pub spawn_interval_ms: u64,
    /// Milliseconds between countdown ticks
    pub tick_interval_ms: u64,
    /// Ticks a ball survives unselected
    pub object_lifetime_ticks: u32,
    /// Ticks in a round
    pub round_length_ticks: u32,
    /// Fewest balls per spawn tick
    pub spawn_min: u32,
    /// Most balls per spawn tick
    pub spawn_max: u32,
    /// Where balls may appear
    pub spawn_bounds: SpawnBounds,
    /// Ball radius for the scene
    pub ball_radius: f32,
    /// Fixed RNG seed, random per session when unset
    pub seed: Option<u64>,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 2000,
            tick_interval_ms: 1000,
            object_lifetime_ticks: 3,
            round_length_ticks: 30,
            spawn_min: 1,
            spawn_max: 4,
            spawn_bounds: SpawnBounds::default(),
            ball_radius: 0.5,
            seed: None,
        }
    }
}

impl RoundConfig {
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reject values the round state machine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::Invalid("SPAWN_INTERVAL_MS"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("TICK_INTERVAL_MS"));
        }
        if self.object_lifetime_ticks == 0 {
            return Err(ConfigError::Invalid("OBJECT_LIFETIME_TICKS"));
        }
        if self.round_length_ticks == 0 {
            return Err(ConfigError::Invalid("ROUND_LENGTH_TICKS"));
        }
        if self.spawn_min == 0 || self.spawn_min > self.spawn_max {
            return Err(ConfigError::Invalid("SPAWN_MIN"));
        }
        if !self.spawn_bounds.is_valid() {
            return Err(ConfigError::Invalid("SPAWN_BOUNDS"));
        }
        if !(self.ball_radius > 0.0) {
            return Err(ConfigError::Invalid("BALL_RADIUS"));
        }
        Ok(())
    }

    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let seed = match env::var("ROUND_SEED") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("ROUND_SEED"))?,
            ),
            Err(_) => None,
        };

        let round = Self {
            spawn_interval_ms: var_or("SPAWN_INTERVAL_MS", defaults.spawn_interval_ms)?,
            tick_interval_ms: var_or("TICK_INTERVAL_MS", defaults.tick_interval_ms)?,
            object_lifetime_ticks: var_or("OBJECT_LIFETIME_TICKS", defaults.object_lifetime_ticks)?,
            round_length_ticks: var_or("ROUND_LENGTH_TICKS", defaults.round_length_ticks)?,
            spawn_min: var_or("SPAWN_MIN", defaults.spawn_min)?,
            spawn_max: var_or("SPAWN_MAX", defaults.spawn_max)?,
            spawn_bounds: defaults.spawn_bounds,
            ball_radius: var_or("BALL_RADIUS", defaults.ball_radius)?,
            seed,
        };
        round.validate()?;
        Ok(round)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),

            round: RoundConfig::from_env()?,
        })
    }
}

/// Read and parse an optional variable
fn var_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
