//! Game loop
//!
//! Owns the arena for the lifetime of a session. Commands from any number of
//! transports are queued in the `CommandBuffer` and applied strictly one after
//! another; the periodic crystal spawn is fired from the same task, so the
//! arena never sees concurrent access.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{interval, interval_at, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::game::arena::Arena;
use crate::game::command_buffer::{CommandBuffer, CommandSender};
use crate::metrics::Metrics;

/// Scheduling parameters for the loop
#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    pub initial_crystals: usize,
    pub crystal_spawn_interval: Duration,
    pub command_poll_interval: Duration,
    pub command_buffer_capacity: usize,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for GameLoopConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            initial_crystals: config.initial_crystals,
            crystal_spawn_interval: config.crystal_spawn_interval,
            command_poll_interval: config.command_poll_interval,
            command_buffer_capacity: config.command_buffer_capacity,
        }
    }
}

pub struct GameLoop {
    arena: Arena,
    commands: CommandBuffer,
    config: GameLoopConfig,
    metrics: Option<Arc<Metrics>>,
}

impl GameLoop {
    pub fn new(arena: Arena, config: GameLoopConfig) -> Self {
        Self {
            commands: CommandBuffer::new(config.command_buffer_capacity),
            arena,
            config,
            metrics: None,
        }
    }

    /// Attach a metrics registry; it also subscribes to the arena's events
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.arena.subscribe(Metrics::observer(metrics.clone()));
        self.metrics = Some(metrics);
        self
    }

    /// Handle for a transport to queue commands
    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable access before the loop starts (e.g. to subscribe observers)
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Apply every queued command in arrival order.
    ///
    /// Returns the number of commands applied.
    pub fn process_commands(&mut self) -> usize {
        let pending = self.commands.drain();
        let count = pending.len();

        for command in pending {
            let started = Instant::now();
            self.arena.apply(command);
            if let Some(metrics) = &self.metrics {
                metrics.record_command_time(started.elapsed());
            }
        }

        if count > 0 {
            self.refresh_gauges();
        }
        count
    }

    /// One tick of the periodic crystal spawn
    pub fn spawn_tick(&mut self) {
        if let Some(crystal_id) = self.arena.spawn_crystal() {
            debug!(crystal_id = crystal_id.as_str(), "Periodic crystal spawned");
        }
        self.refresh_gauges();
    }

    fn refresh_gauges(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.update_from_state(self.arena.state());
        }
    }

    /// Seed the arena and run until `shutdown` resolves. Returns the arena.
    pub async fn run<F>(mut self, shutdown: F) -> Arena
    where
        F: Future<Output = ()>,
    {
        self.arena.seed_crystals(self.config.initial_crystals);
        self.refresh_gauges();

        let period = self.config.crystal_spawn_interval;
        let mut spawn_timer = interval_at(tokio::time::Instant::now() + period, period);
        spawn_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut poll_timer = interval(self.config.command_poll_interval);
        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            spawn_interval_ms = period.as_millis() as u64,
            "Game loop running"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = spawn_timer.tick() => self.spawn_tick(),
                _ = poll_timer.tick() => {
                    self.process_commands();
                }
            }
        }

        // Apply whatever arrived before shutdown
        self.process_commands();
        info!(
            players = self.arena.state().players.len(),
            crystals = self.arena.state().crystals.len(),
            "Game loop stopped"
        );
        self.arena
    }
}
