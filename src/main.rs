//! Blob Arena headless client
//!
//! Reads newline-delimited JSON from stdin (authoritative server messages
//! and local input lines), runs the predictive frame loop, and writes
//! outbound messages to stdout. Logs go to stderr.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blob_arena_client::config::Config;
use blob_arena_client::game::GameSession;
use blob_arena_client::util::time::unix_micros;
use blob_arena_client::ws::protocol::{decode_line, Inbound, ProtocolError};
use blob_arena_client::ws::{run_session, StdioTransport};

/// Inbound lines buffered between frames
const INBOUND_QUEUE: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    let seed = config.rng_seed.unwrap_or_else(unix_micros);
    info!(seed, frame_rate = config.frame_rate, "Starting Blob Arena client");

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE);
    let reader = tokio::spawn(read_stdin(inbound_tx));

    let session = GameSession::new(seed, config.state_send_interval_ms);
    let mut transport = StdioTransport::new(std::io::stdout());

    tokio::select! {
        session = run_session(&config, session, inbound_rx, &mut transport) => {
            info!(frames = session.frame_count(), status = ?session.status(), "Session ended");
        }
        _ = shutdown_signal() => {}
    }

    reader.abort();
    info!("Client shutdown complete");
    Ok(())
}

/// Forward decoded stdin lines until EOF
async fn read_stdin(tx: mpsc::Sender<Inbound>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match decode_line(&line) {
                Ok(inbound) => {
                    if tx.send(inbound).await.is_err() {
                        break;
                    }
                }
                Err(ProtocolError::Empty) => {}
                Err(e) => warn!(error = %e, "Ignoring inbound line"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
}

/// Initialize tracing/logging on stderr; stdout carries the wire
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
