use std::str::FromStr;
use std::time::Duration;

use crate::game::constants::{game, spawn};
use crate::game::state::{ArenaConfig, Screen};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Grid dimensions
    pub screen: Screen,
    /// Gameplay tunables
    pub arena: ArenaConfig,
    /// Crystals dropped when the arena starts
    pub initial_crystals: usize,
    /// Period of the automatic crystal spawn
    pub crystal_spawn_interval: Duration,
    /// How often queued commands are drained
    pub command_poll_interval: Duration,
    /// Capacity of the command buffer between transports and the game loop
    pub command_buffer_capacity: usize,
    /// Port for the metrics endpoint (disabled when `None`)
    pub metrics_port: Option<u16>,
    /// Fixed RNG seed for reproducible sessions
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            screen: Screen::default(),
            arena: ArenaConfig::default(),
            initial_crystals: spawn::INITIAL_CRYSTALS,
            crystal_spawn_interval: Duration::from_secs(spawn::INTERVAL_SECS),
            command_poll_interval: Duration::from_millis(game::COMMAND_POLL_MS),
            command_buffer_capacity: game::COMMAND_BUFFER_CAPACITY,
            metrics_port: None,
            seed: None,
        }
    }
}

/// Read and parse an environment variable, warning on malformed values
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
            None
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(width) = env_parse::<i32>("ARENA_WIDTH") {
            if width > 0 {
                config.screen.width = width;
            } else {
                tracing::warn!("ARENA_WIDTH must be > 0, using default");
            }
        }

        if let Some(height) = env_parse::<i32>("ARENA_HEIGHT") {
            if height > 0 {
                config.screen.height = height;
            } else {
                tracing::warn!("ARENA_HEIGHT must be > 0, using default");
            }
        }

        if let Some(pixels) = env_parse("PIXELS_PER_FIELD") {
            config.screen.pixels_per_field = pixels;
        }

        if let Some(distance) = env_parse("MAX_COLLISION_DISTANCE") {
            config.arena.max_collision_distance = distance;
        }
        if let Some(cost) = env_parse("PLAYER_COLLISION_COST") {
            config.arena.player_collision_cost = cost;
        }
        if let Some(cost) = env_parse("WALL_COLLISION_COST") {
            config.arena.wall_collision_cost = cost;
        }
        if let Some(score) = env_parse("INITIAL_SCORE") {
            config.arena.initial_score = score;
        }
        if let Some(value) = env_parse("AUTO_DROP_CRYSTAL_VALUE") {
            config.arena.auto_drop_crystal_value = value;
        }
        if let Some(show) = env_parse("SHOW_POTS_VALUE") {
            config.arena.show_pots_value = show;
        }

        if let Some(count) = env_parse("INITIAL_CRYSTALS") {
            config.initial_crystals = count;
        }

        if let Some(secs) = env_parse::<u64>("CRYSTAL_SPAWN_INTERVAL_SECS") {
            if secs > 0 {
                config.crystal_spawn_interval = Duration::from_secs(secs);
            } else {
                tracing::warn!("CRYSTAL_SPAWN_INTERVAL_SECS must be > 0, using default");
            }
        }

        if let Some(capacity) = env_parse::<usize>("COMMAND_BUFFER_CAPACITY") {
            if capacity > 0 && capacity <= 1_000_000 {
                config.command_buffer_capacity = capacity;
            } else {
                tracing::warn!("COMMAND_BUFFER_CAPACITY must be 1-1000000, using default");
            }
        }

        config.metrics_port = env_parse::<u16>("METRICS_PORT").filter(|port| *port > 0);
        config.seed = env_parse("ARENA_SEED");

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen.width <= 0 || self.screen.height <= 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.screen.width,
                height: self.screen.height,
            });
        }
        if self.crystal_spawn_interval.is_zero() {
            return Err(ConfigError::ZeroSpawnInterval);
        }
        if self.command_poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.command_buffer_capacity == 0 {
            return Err(ConfigError::ZeroBufferCapacity);
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Arena grid must be at least 1x1 (got {width}x{height})")]
    EmptyGrid { width: i32, height: i32 },
    #[error("Crystal spawn interval cannot be 0")]
    ZeroSpawnInterval,
    #[error("Command poll interval cannot be 0")]
    ZeroPollInterval,
    #[error("Command buffer capacity must be at least 1")]
    ZeroBufferCapacity,
}
