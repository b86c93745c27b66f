use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, PriceTick};
use feed::{Broadcaster, LatestCandles, Relay};
use market::{FmpClient, UpstreamStream};
use strategy::{SignalService, StrategyFileConfig, StrategyRegistry};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(port = cfg.port, feed = cfg.feed_url.is_some(), "signald starting");

    // ── Strategy registry ─────────────────────────────────────────────────────
    let strategy_file = StrategyFileConfig::load_or_default(&cfg.strategy_config_path)
        .unwrap_or_else(|e| panic!("Failed to load strategy config: {e}"));
    let registry = StrategyRegistry::from_config(&strategy_file)
        .unwrap_or_else(|e| panic!("Invalid strategy config: {e}"));
    info!(strategies = ?registry.names(), default = registry.default_name(), "Strategies ready");

    // ── Market data source ────────────────────────────────────────────────────
    let periods = registry.indicators().clone();
    let source = FmpClient::new(&cfg.fmp_api_key, &cfg.fmp_base_url, cfg.http_timeout)
        .unwrap_or_else(|e| panic!("Failed to create market data client: {e}"))
        .with_periods(periods.rsi_period, periods.fast_period, periods.slow_period);

    let signals = Arc::new(SignalService::new(
        Arc::new(source),
        Arc::new(registry),
        cfg.candle_limit,
    ));

    // ── Live feed relay ───────────────────────────────────────────────────────
    let broadcaster = Broadcaster::new();
    let latest = LatestCandles::new();
    match &cfg.feed_url {
        Some(url) => {
            let (tick_tx, tick_rx) = mpsc::channel::<PriceTick>(1024);
            tokio::spawn(UpstreamStream::new(url, cfg.feed_retry_delay, tick_tx).run());
            tokio::spawn(Relay::new(tick_rx, broadcaster.clone(), latest.clone()).run());
        }
        None => warn!("FEED_URL not set, live feed relay disabled"),
    }

    // ── HTTP API ──────────────────────────────────────────────────────────────
    let api_state = api::AppState {
        signals,
        broadcaster,
        latest,
    };
    let port = cfg.port;
    let server = tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "API server stopped");
        }
    });

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received. Exiting."),
        _ = server => error!("API server exited"),
    }
}
