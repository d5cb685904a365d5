//! Caution-Feed Service — Binary Entrypoint
//! Boots the Axum HTTP server and the two background sweeps (poll, retention).

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use caution_feed::api::{create_router, AppState};
use caution_feed::config::{load_sources_default, seed_registry, AppConfig};
use caution_feed::fetch::RssFetcher;
use caution_feed::ingest::scheduler::Scheduler;
use caution_feed::metrics::Metrics;
use caution_feed::registry::SourceRegistry;
use caution_feed::store::CautionStore;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("caution_feed=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env()?;
    let metrics = Metrics::init();

    let registry = Arc::new(SourceRegistry::new());
    let seeds = load_sources_default()?;
    let seeded = seed_registry(&registry, seeds)?;
    tracing::info!(sources = seeded, "source registry seeded");

    let store = Arc::new(CautionStore::new());
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        Arc::new(RssFetcher::new()),
        cfg.scheduler,
    ));
    let _handles = scheduler.spawn();

    let app = create_router(AppState {
        registry,
        store,
        scheduler,
    })
    .merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "caution-feed listening");
    axum::serve(listener, app).await.context("serving http")?;
    Ok(())
}
