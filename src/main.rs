use anyhow::{Context, Result};
use call_bridge::{create_router, http::media_stream_url, AppState, Config};
use clap::Parser;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "call-bridge", about = "Phone call ↔ streaming transcription bridge")]
struct Args {
    /// Config file path (extension optional)
    #[arg(long, default_value = "config/call-bridge")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("Call Bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("HTTP server will bind to {}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("Media streams will connect to: {}", media_stream_url(&cfg, "<example>"));
    if cfg.transcription.api_key.is_none() {
        warn!("No transcription credential (AAI_TOKEN) set; media legs will close immediately");
    }

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let retention = cfg.sessions.clone();

    let state = AppState::from_config(cfg)?;
    let _sweeper = state.registry().spawn_sweeper(
        Duration::from_secs(retention.idle_ttl_secs),
        Duration::from_secs(retention.sweep_interval_secs),
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server error")?;

    Ok(())
}
