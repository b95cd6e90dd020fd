//! Multiplayer Truco server using the async room actor model.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Error};
use log::info;
use pico_args::Arguments;
use truco::room::RoomManager;
use truco_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run a multiplayer Truco server

USAGE:
  truco_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address   [default: env SERVER_BIND or 127.0.0.1:6969]
  --metrics-bind  IP:PORT  Prometheus exporter address  [default: env METRICS_BIND or disabled]
  --bot-delay-ms  MS       Pause before a bot acts      [default: env BOT_DELAY_MS or 2000]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus exporter bind address
  BOT_DELAY_MS             Pause before a bot acts
  ROUND_END_DELAY_MS       Pause between rounds
  GAME_END_DELAY_MS        Pause between hands
  DEALER_DELAY_MS          Pause before the blackjack dealer plays
  MAX_ROOMS                Maximum number of open rooms
  RUST_LOG                 Log filter (e.g., info,truco=debug)
";

struct Args {
    bind: Option<SocketAddr>,
    metrics_bind: Option<SocketAddr>,
    bot_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        metrics_bind: pargs.opt_value_from_str("--metrics-bind")?,
        bot_delay_ms: pargs.opt_value_from_str("--bot-delay-ms")?,
    };

    logging::init();

    let config = ServerConfig::from_env(
        args.bind,
        args.metrics_bind,
        args.bot_delay_ms.map(Duration::from_millis),
    )?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics at http://{addr}/metrics");
    }

    let room_manager = RoomManager::new(config.room_template(), config.max_rooms);
    info!(
        "Room limit {}, bot delay {} ms",
        config.max_rooms,
        config.timings.bot_delay.as_millis()
    );

    let app = api::create_router(api::AppState::new(room_manager));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
