use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use nervesim_app::{ClientConfig, load_config, run_client, share};
use nervesim_core::{SimConfig, SimulationSession};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "nervesim-app",
    version,
    about = "Drive the hexapod simulation from a network host over WebSocket"
)]
struct Cli {
    /// WebSocket endpoint served by the network host.
    #[arg(long, env = "NERVESIM_URL", default_value = "ws://127.0.0.1:8888/ws")]
    url: String,

    /// JSON simulation config; missing fields use defaults.
    #[arg(long, env = "NERVESIM_CONFIG")]
    config: Option<PathBuf>,

    /// Arena width, overriding the config file.
    #[arg(long)]
    arena_width: Option<f64>,

    /// Arena height, overriding the config file.
    #[arg(long)]
    arena_height: Option<f64>,

    /// First reconnect delay in milliseconds.
    #[arg(long, default_value_t = 1_000)]
    reconnect_ms: u64,

    /// Upper bound for the reconnect delay in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    max_reconnect_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(width) = cli.arena_width {
        config.arena_width = width;
    }
    if let Some(height) = cli.arena_height {
        config.arena_height = height;
    }

    let session = SimulationSession::new(config)?;
    let bounds = session.default_bounds();
    info!(
        url = %cli.url,
        width = bounds.width(),
        height = bounds.height(),
        "starting nervesim bridge"
    );
    let client = ClientConfig {
        url: cli.url,
        bounds,
        reconnect: Duration::from_millis(cli.reconnect_ms),
        max_reconnect: Duration::from_millis(cli.max_reconnect_ms),
    };

    tokio::select! {
        result = run_client(share(session), client) => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted; shutting down");
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
