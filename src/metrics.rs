//! Prometheus-compatible metrics
//!
//! Counters are fed by an event-bus observer and by the game loop. The optional
//! HTTP endpoint serves them at `/metrics` (text) and `/metrics/json`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::game::events::{AudioCue, GameEvent};
use crate::game::state::ArenaState;

/// Samples kept for latency percentiles
const HISTORY_LEN: usize = 1000;

/// Metrics registry for the arena server
#[derive(Debug)]
pub struct Metrics {
    // Gauges, refreshed from arena state
    pub players: AtomicU64,
    pub alive_players: AtomicU64,
    pub crystals: AtomicU64,
    pub crystal_quantity: AtomicU64,

    // Counters, fed by events
    pub events_emitted: AtomicU64,
    pub crystals_added: AtomicU64,
    pub crystals_removed: AtomicU64,
    pub wall_collisions: AtomicU64,
    pub player_collisions: AtomicU64,
    pub deaths: AtomicU64,

    // Command processing (microseconds)
    pub commands_processed: AtomicU64,
    pub command_time_p95_us: AtomicU64,
    pub command_time_p99_us: AtomicU64,
    pub command_time_max_us: AtomicU64,

    start_time: Instant,
    command_history: RwLock<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            players: AtomicU64::new(0),
            alive_players: AtomicU64::new(0),
            crystals: AtomicU64::new(0),
            crystal_quantity: AtomicU64::new(0),
            events_emitted: AtomicU64::new(0),
            crystals_added: AtomicU64::new(0),
            crystals_removed: AtomicU64::new(0),
            wall_collisions: AtomicU64::new(0),
            player_collisions: AtomicU64::new(0),
            deaths: AtomicU64::new(0),
            commands_processed: AtomicU64::new(0),
            command_time_p95_us: AtomicU64::new(0),
            command_time_p99_us: AtomicU64::new(0),
            command_time_max_us: AtomicU64::new(0),
            start_time: Instant::now(),
            command_history: RwLock::new(VecDeque::with_capacity(HISTORY_LEN)),
        }
    }

    /// Event-bus observer that counts what the arena emits
    pub fn observer(metrics: Arc<Metrics>) -> impl FnMut(&GameEvent) + Send + 'static {
        move |event| metrics.record_event(event)
    }

    pub fn record_event(&self, event: &GameEvent) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        match event {
            GameEvent::AddCrystal { .. } => {
                self.crystals_added.fetch_add(1, Ordering::Relaxed);
            }
            GameEvent::RemoveCrystal { .. } => {
                self.crystals_removed.fetch_add(1, Ordering::Relaxed);
            }
            GameEvent::PlayAudio { audio, .. } => {
                let counter = match audio {
                    AudioCue::WallCollision => &self.wall_collisions,
                    AudioCue::PlayerCollision => &self.player_collisions,
                    AudioCue::Dying => &self.deaths,
                    AudioCue::NewCrystal | AudioCue::DrinkPot => return,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Refresh gauges from the current arena
    pub fn update_from_state(&self, state: &ArenaState) {
        let alive = state.players.values().filter(|p| p.is_alive()).count();
        self.players
            .store(state.players.len() as u64, Ordering::Relaxed);
        self.alive_players.store(alive as u64, Ordering::Relaxed);
        self.crystals
            .store(state.crystals.len() as u64, Ordering::Relaxed);
        self.crystal_quantity
            .store(state.total_crystal_quantity(), Ordering::Relaxed);
    }

    /// Record how long one command took and update percentiles
    pub fn record_command_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.commands_processed.fetch_add(1, Ordering::Relaxed);

        let mut history = self.command_history.write();
        history.push_back(us);
        while history.len() > HISTORY_LEN {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;

            self.command_time_p95_us
                .store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.command_time_p99_us
                .store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.command_time_max_us
                .store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    pub fn players(&self) -> u64 {
        self.players.load(Ordering::Relaxed)
    }

    pub fn commands_processed(&self) -> u64 {
        self.commands_processed.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("crystal_arena_players", "Players in the arena", "gauge", self.players.load(Ordering::Relaxed));
        metric!("crystal_arena_players_alive", "Players with a positive score", "gauge", self.alive_players.load(Ordering::Relaxed));
        metric!("crystal_arena_crystals", "Crystals on the grid", "gauge", self.crystals.load(Ordering::Relaxed));
        metric!("crystal_arena_crystal_quantity", "Sum of crystal quantities on the grid", "gauge", self.crystal_quantity.load(Ordering::Relaxed));
        metric!("crystal_arena_events_total", "Events emitted", "counter", self.events_emitted.load(Ordering::Relaxed));
        metric!("crystal_arena_crystals_added_total", "Crystal placements", "counter", self.crystals_added.load(Ordering::Relaxed));
        metric!("crystal_arena_crystals_removed_total", "Crystals consumed", "counter", self.crystals_removed.load(Ordering::Relaxed));
        metric!("crystal_arena_wall_collisions_total", "Wall collisions", "counter", self.wall_collisions.load(Ordering::Relaxed));
        metric!("crystal_arena_player_collisions_total", "Player collisions", "counter", self.player_collisions.load(Ordering::Relaxed));
        metric!("crystal_arena_deaths_total", "Collisions that left a player at zero", "counter", self.deaths.load(Ordering::Relaxed));
        metric!("crystal_arena_commands_total", "Commands applied", "counter", self.commands_processed.load(Ordering::Relaxed));
        metric!("crystal_arena_command_time_p95_us", "Command time 95th percentile", "gauge", self.command_time_p95_us.load(Ordering::Relaxed));
        metric!("crystal_arena_command_time_p99_us", "Command time 99th percentile", "gauge", self.command_time_p99_us.load(Ordering::Relaxed));
        metric!("crystal_arena_command_time_max_us", "Slowest recent command", "gauge", self.command_time_max_us.load(Ordering::Relaxed));
        metric!("crystal_arena_uptime_seconds", "Server uptime", "counter", self.uptime_seconds());

        output
    }

    /// JSON summary for dashboards
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "players": {
                "total": self.players.load(Ordering::Relaxed),
                "alive": self.alive_players.load(Ordering::Relaxed),
            },
            "crystals": {
                "count": self.crystals.load(Ordering::Relaxed),
                "quantity": self.crystal_quantity.load(Ordering::Relaxed),
                "added": self.crystals_added.load(Ordering::Relaxed),
                "removed": self.crystals_removed.load(Ordering::Relaxed),
            },
            "collisions": {
                "wall": self.wall_collisions.load(Ordering::Relaxed),
                "player": self.player_collisions.load(Ordering::Relaxed),
                "deaths": self.deaths.load(Ordering::Relaxed),
            },
            "commands": {
                "total": self.commands_processed.load(Ordering::Relaxed),
                "p95_us": self.command_time_p95_us.load(Ordering::Relaxed),
                "p99_us": self.command_time_p99_us.load(Ordering::Relaxed),
                "max_us": self.command_time_max_us.load(Ordering::Relaxed),
            },
            "events": self.events_emitted.load(Ordering::Relaxed),
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve metrics over plain HTTP
#[cfg(feature = "metrics_http")]
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);

                    // Check the more specific path first
                    let (content_type, body) = if request.starts_with("GET /metrics/json") {
                        ("application/json", metrics.to_json())
                    } else if request.starts_with("GET /metrics") {
                        ("text/plain; version=0.0.4", metrics.to_prometheus())
                    } else if request.starts_with("GET /health") {
                        ("text/plain", "OK".to_string())
                    } else {
                        let response = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
                        let _ = socket.write_all(response.as_bytes()).await;
                        return;
                    };

                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        content_type,
                        body.len(),
                        body
                    );
                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        tracing::debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{crystal_id, Crystal, Player};

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.players(), 0);
        assert_eq!(metrics.commands_processed(), 0);
    }

    #[test]
    fn test_record_command_time() {
        let metrics = Metrics::new();
        for i in 0..100 {
            metrics.record_command_time(Duration::from_micros(10 + i));
        }

        assert_eq!(metrics.commands_processed(), 100);
        assert!(metrics.command_time_p95_us.load(Ordering::Relaxed) >= 100);
        assert_eq!(metrics.command_time_max_us.load(Ordering::Relaxed), 109);
    }

    #[test]
    fn test_observer_counts_events() {
        let metrics = Arc::new(Metrics::new());
        let mut observer = Metrics::observer(metrics.clone());

        observer(&GameEvent::play_audio(AudioCue::WallCollision, ["p1".to_string()]));
        observer(&GameEvent::play_audio(AudioCue::Dying, ["p1".to_string()]));
        observer(&GameEvent::play_audio(AudioCue::DrinkPot, ["p1".to_string()]));
        observer(&GameEvent::RemoveCrystal {
            crystal_id: "1-1".to_string(),
        });

        assert_eq!(metrics.events_emitted.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.wall_collisions.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.deaths.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.crystals_removed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.player_collisions.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_update_from_state() {
        let metrics = Metrics::new();
        let mut state = ArenaState::default();
        state
            .players
            .insert("p1".to_string(), Player::new("p1".to_string(), 0, 0, 10));
        state
            .players
            .insert("p2".to_string(), Player::new("p2".to_string(), 1, 1, 0));
        state
            .crystals
            .insert(crystal_id(2, 2), Crystal { x: 2, y: 2, quantity: 30 });

        metrics.update_from_state(&state);

        assert_eq!(metrics.players(), 2);
        assert_eq!(metrics.alive_players.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.crystal_quantity.load(Ordering::Relaxed), 30);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = Metrics::new();
        metrics.players.store(7, Ordering::Relaxed);

        let output = metrics.to_prometheus();
        assert!(output.contains("crystal_arena_players 7"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_json_format() {
        let metrics = Metrics::new();
        metrics.players.store(3, Ordering::Relaxed);

        let json: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(json["players"]["total"], 3);
        assert!(json["collisions"].is_object());
    }
}
