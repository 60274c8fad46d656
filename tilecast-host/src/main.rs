//! tilecast host: entry point.
//!
//! ```text
//! tilecast-host                        Run one "console" client until Ctrl-C
//! tilecast-host --client a --client b  Run a session per named client
//! tilecast-host --duration-secs 10     Stop after ten seconds
//! tilecast-host --config <path>        Load a custom config TOML
//! tilecast-host --gen-config           Write default config to stdout
//! tilecast-host --write-config         Write default config to the --config path
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tilecast_host::config::HostConfig;
use tilecast_host::registry::{ClientId, SessionRegistry};
use tilecast_host::surface::LogSurface;

/// How often per-client counters are logged.
const STATS_INTERVAL: Duration = Duration::from_secs(5);

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tilecast-host", about = "Stream emulator displays onto map tiles")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tilecast-host.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to the `--config` path and exit.
    #[arg(long)]
    write_config: bool,

    /// Client to start a session for (repeatable).
    #[arg(long = "client", default_value = "console")]
    clients: Vec<String>,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    duration_secs: Option<u64>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        println!("{}", HostConfig::default_toml()?);
        return Ok(());
    }
    if cli.write_config {
        HostConfig::write_default(&cli.config)?;
        println!("Default configuration written to {}.", cli.config.display());
        return Ok(());
    }

    let config = HostConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let session = config.to_session_config();
    info!("tilecast-host v{}", env!("CARGO_PKG_VERSION"));
    info!("backend: {}", config.backend_kind().name());
    info!("anchor: ({}, {})", session.anchor_x, session.anchor_z);
    info!("scale: {}  render fps: {}", session.scale, session.render_fps);

    let registry = Arc::new(SessionRegistry::new(config));

    for name in &cli.clients {
        let client = ClientId::new(name.as_str());
        let surface = Arc::new(LogSurface::new(name.as_str()));
        if let Err(e) = registry.start_session(client, surface).await {
            warn!(client = %name, "could not start session: {e}");
        }
    }

    if registry.active_clients().await.is_empty() {
        registry.shutdown_all().await;
        return Err("no session could be started".into());
    }

    let reporter = tokio::spawn(report_stats(Arc::clone(&registry)));

    match cli.duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    info!("run time of {secs}s elapsed; shutting down");
                }
                _ = tokio::signal::ctrl_c() => info!("Ctrl-C received; shutting down"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Ctrl-C received; shutting down");
        }
    }

    reporter.abort();
    let stopped = registry.shutdown_all().await;
    info!("stopped {stopped} session(s)");
    Ok(())
}

/// Log each client's counters periodically.
async fn report_stats(registry: Arc<SessionRegistry>) {
    let mut ticker = tokio::time::interval(STATS_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        for client in registry.active_clients().await {
            if let Ok(stats) = registry.stats(&client).await {
                info!(
                    %client,
                    frames = stats.frames_rendered,
                    batches = stats.batches_sent,
                    tiles = stats.tiles_sent,
                    errors = stats.tick_errors,
                    "session stats"
                );
            }
        }
    }
}
