use anyhow::{Context, Result};
use clap::Parser;
use parley::{create_router, AdmissionGate, AppState, Config, OpenAiClient};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "parley", about = "Token gateway for realtime voice sessions")]
struct Cli {
    /// Config file path (extension optional, file optional)
    #[arg(long, default_value = "config/parley")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Parley gateway v0.1.0");
    info!("Service: {}", cfg.service.name);
    info!("Admission limit: {} concurrent sessions", cfg.gate.max_sessions);

    let vendor = Arc::new(OpenAiClient::new(
        cfg.vendor.base_url.as_str(),
        cfg.vendor.api_key.as_str(),
    )?);
    let gate = Arc::new(AdmissionGate::new(cfg.gate.max_sessions));
    let app = create_router(AppState::new(gate, vendor));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
