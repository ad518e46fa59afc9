mod api;
mod middleware;

use std::sync::Arc;

use qcsite_collector::{BroadcastSink, CollectionScheduler, CycleSettings, LocationStore};
use qcsite_core::{AppConfig, LocationRegistry};
use qcsite_scoring::{HeuristicRecommender, LlmRecommender, Recommender};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

/// Capacity of the live-update channel. Subscribers further behind than
/// this skip ahead.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = qcsite_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        env = %config.env,
        provider = %config.provider,
        "starting qcsite server"
    );

    let registry = load_registry(&config)?;
    let provider = qcsite_scraper::build_provider(&config)?;
    let recommender = build_recommender(&config)?;
    let events = BroadcastSink::new(EVENT_CHANNEL_CAPACITY);

    let scheduler = Arc::new(CollectionScheduler::new(
        registry,
        provider,
        recommender,
        LocationStore::new(),
        Arc::new(events.clone()),
        qcsite_scraper::call_budget(&config),
    ));

    if config.scraping_enabled {
        let settings =
            CycleSettings::from_millis(config.scraping_interval_ms, config.scraping_delay_ms);
        if let Err(e) = scheduler.start(settings).await {
            tracing::error!(error = %e, "failed to start collection scheduler");
            return Err(e.into());
        }
    } else {
        tracing::info!("scheduled collection disabled; serving on-demand refreshes only");
    }

    let app = build_app(AppState {
        scheduler: Arc::clone(&scheduler),
        events,
    });

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(bind_addr = %config.bind_addr, error = %e, "failed to bind");
            scheduler.stop().await;
            return Err(e.into());
        }
    };
    tracing::info!(bind_addr = %config.bind_addr, "listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.stop().await;
    served?;
    Ok(())
}

fn load_registry(config: &AppConfig) -> anyhow::Result<LocationRegistry> {
    let registry = match &config.locations_path {
        Some(path) => qcsite_core::load_locations(path)?,
        None => LocationRegistry::default(),
    };
    tracing::info!(locations = registry.len(), "location registry loaded");
    Ok(registry)
}

fn build_recommender(config: &AppConfig) -> anyhow::Result<Arc<dyn Recommender>> {
    match &config.llm {
        Some(llm) => {
            tracing::info!(model = %llm.model, "using LLM recommendation text");
            Ok(Arc::new(LlmRecommender::new(llm.clone())?))
        }
        None => Ok(Arc::new(HeuristicRecommender)),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
