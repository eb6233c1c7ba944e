use std::time::Duration;

use anyhow::Result;
use technical_analysis::SignalEngine;
use tokio::time;

mod config;
mod providers;
mod runner;

use config::RunnerConfig;
use runner::{build_provider, run_once};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing (stderr, so stdout only carries signals)
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // 2. Configuration
    let config = RunnerConfig::from_env()?;
    tracing::info!("Starting signal runner");
    tracing::info!("  Pair: {} ({})", config.pair.name, config.pair.id);
    tracing::info!("  Timeframe: {}", config.timeframe);
    match &config.candles_file {
        Some(path) => tracing::info!("  Candles file: {}", path.display()),
        None => tracing::info!("  Candles file: none, using synthetic data"),
    }

    let engine = SignalEngine::new(config.analyzer_config());
    let provider = build_provider(&config);

    // 3. One-shot mode
    if config.refresh_interval_seconds == 0 {
        let signal = run_once(&engine, provider.as_ref(), &config).await?;
        println!("{}", serde_json::to_string_pretty(&signal)?);
        return Ok(());
    }

    // 4. Periodic mode: recompute on every tick until Ctrl-C
    tracing::info!("  Refresh interval: {} seconds", config.refresh_interval_seconds);
    let mut interval = time::interval(Duration::from_secs(config.refresh_interval_seconds));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match run_once(&engine, provider.as_ref(), &config).await {
                    Ok(signal) => println!("{}", serde_json::to_string(&signal)?),
                    Err(e) => tracing::error!("Error in analysis cycle: {e:#}"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Received SIGINT, shutting down");
                break;
            }
        }
    }

    Ok(())
}
