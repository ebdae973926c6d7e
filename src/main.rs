use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crystal_arena::config::ServerConfig;
use crystal_arena::game::arena::Arena;
use crystal_arena::game::constants::game::LEADERBOARD_SIZE;
use crystal_arena::game::game_loop::{GameLoop, GameLoopConfig};
use crystal_arena::game::leaderboard::top_players;
use crystal_arena::metrics::Metrics;
use crystal_arena::net::connection::{event_forwarder, pump_commands, pump_messages};
use crystal_arena::net::protocol::{ArenaSnapshot, ServerMessage};

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // stdout carries the event stream, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run());

    // A blocking stdin read may still be parked; don't wait on it
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

async fn run() -> anyhow::Result<()> {
    info!("Crystal Arena Server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: {}x{} grid, spawn every {}s, seed={:?}",
        config.screen.width,
        config.screen.height,
        config.crystal_spawn_interval.as_secs(),
        config.seed
    );

    let metrics = Arc::new(Metrics::new());

    spawn_metrics_server(&config, &metrics);

    let arena = match config.seed {
        Some(seed) => Arena::with_seed(config.screen, config.arena, seed),
        None => Arena::new(config.screen, config.arena),
    };
    let mut game_loop =
        GameLoop::new(arena, GameLoopConfig::from(&config)).with_metrics(metrics.clone());

    // Outbound: setup snapshot first, then every event as it happens
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    outbound_tx.send(ServerMessage::Setup(ArenaSnapshot::from_state(
        game_loop.arena().state(),
        LEADERBOARD_SIZE,
    )))?;
    game_loop.arena_mut().subscribe(event_forwarder(outbound_tx));
    let writer = tokio::spawn(pump_messages(tokio::io::stdout(), outbound_rx));

    // Inbound: one command per stdin line
    let sender = game_loop.command_sender();
    let (input_closed_tx, input_closed_rx) = oneshot::channel::<()>();
    let reader = tokio::spawn(async move {
        let result = pump_commands(BufReader::new(tokio::io::stdin()), sender).await;
        let _ = input_closed_tx.send(());
        result
    });

    let shutdown = async {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutdown signal received");
            }
            _ = input_closed_rx => {
                info!("Input closed");
            }
        }
    };

    info!("Server ready, reading commands from stdin");
    let arena = game_loop.run(shutdown).await;

    for entry in top_players(arena.state(), LEADERBOARD_SIZE) {
        info!("#{} {} ({} points)", entry.rank, entry.nick_name, entry.score);
    }

    // Dropping the arena drops the forwarder, which lets the writer finish
    drop(arena);
    match writer.await? {
        Ok(written) => info!("Wrote {} messages", written),
        Err(e) => error!("Output error: {}", e),
    }

    if reader.is_finished() {
        match reader.await? {
            Ok(stats) => info!(
                "Inbound: {} accepted, {} malformed, {} dropped",
                stats.accepted, stats.malformed, stats.dropped
            ),
            Err(e) => error!("Input error: {}", e),
        }
    } else {
        reader.abort();
    }

    info!(
        "Server stopped after {}s: {} commands, {} players at exit",
        metrics.uptime_seconds(),
        metrics.commands_processed(),
        metrics.players()
    );
    Ok(())
}

#[cfg(feature = "metrics_http")]
fn spawn_metrics_server(config: &ServerConfig, metrics: &Arc<Metrics>) {
    let Some(port) = config.metrics_port else {
        return;
    };
    let metrics = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = crystal_arena::metrics::start_metrics_server(metrics, port).await {
            error!("Metrics server error: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics_http"))]
fn spawn_metrics_server(config: &ServerConfig, _metrics: &Arc<Metrics>) {
    if config.metrics_port.is_some() {
        tracing::warn!("METRICS_PORT set but the metrics_http feature is disabled");
    }
}
