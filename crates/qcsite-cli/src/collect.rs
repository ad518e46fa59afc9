//! One-shot collection for the CLI.
//!
//! Builds the same provider, recommender and collector the server uses, runs
//! a single pass (or a single location), prints the results, and shuts the
//! provider down before returning.

use std::sync::Arc;
use std::time::Duration;

use qcsite_collector::{CollectionScheduler, CycleOutcome, LocationRecord, LocationStore, NullSink};
use qcsite_core::{AppConfig, Location, LocationRegistry};
use qcsite_scoring::{HeuristicRecommender, LlmRecommender, Recommender};

pub(crate) fn load_registry(config: &AppConfig) -> anyhow::Result<LocationRegistry> {
    Ok(match &config.locations_path {
        Some(path) => qcsite_core::load_locations(path)?,
        None => LocationRegistry::default(),
    })
}

fn build_recommender(config: &AppConfig) -> anyhow::Result<Arc<dyn Recommender>> {
    Ok(match &config.llm {
        Some(llm) => Arc::new(LlmRecommender::new(llm.clone())?),
        None => Arc::new(HeuristicRecommender),
    })
}

/// Collect once and print one line (or one JSON record) per location.
///
/// # Errors
///
/// Returns an error if the registry or provider cannot be built, or if
/// `location` is not in the registry. Provider failures for individual
/// services are absorbed as fallback snapshots and do not fail the run.
pub(crate) async fn run_collect(
    config: &AppConfig,
    location: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    let scheduler = CollectionScheduler::new(
        registry,
        qcsite_scraper::build_provider(config)?,
        build_recommender(config)?,
        LocationStore::new(),
        Arc::new(NullSink),
        qcsite_scraper::call_budget(config),
    )
    .with_inter_location_delay(Duration::from_millis(config.scraping_delay_ms));

    let result = collect_records(&scheduler, location).await;
    scheduler.stop().await;
    let records = result?;

    if json {
        let plain: Vec<&LocationRecord> = records.iter().map(Arc::as_ref).collect();
        println!("{}", serde_json::to_string_pretty(&plain)?);
    } else {
        for record in &records {
            println!("{}", format_record(record));
        }
    }
    Ok(())
}

async fn collect_records(
    scheduler: &CollectionScheduler,
    location: Option<&str>,
) -> anyhow::Result<Vec<Arc<LocationRecord>>> {
    if let Some(name) = location {
        return Ok(vec![scheduler.refresh_one(name).await?]);
    }

    match scheduler.run_cycle().await {
        CycleOutcome::Completed {
            locations,
            fallbacks,
            elapsed,
        } => tracing::info!(
            locations,
            fallbacks,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "collection finished"
        ),
        other => anyhow::bail!("collection did not complete: {other:?}"),
    }

    Ok(scheduler
        .registry()
        .iter()
        .filter_map(|loc| scheduler.get_by_name(&loc.name))
        .collect())
}

pub(crate) fn format_location(location: &Location) -> String {
    format!(
        "{:<14} {:<14} {:<16} {:>8.4}, {:>8.4}",
        location.name,
        location.city,
        location.state,
        location.coordinates.lat,
        location.coordinates.lng
    )
}

pub(crate) fn format_record(record: &LocationRecord) -> String {
    let result = &record.result;
    let mut line = format!(
        "{:<14} score {:>3}  {:<15} share {:>5.1}%  competitors {}  {}",
        record.location.name,
        result.warehouse_score,
        result.recommendation_tier.as_str(),
        result.market_share_percent,
        result.competitor_count,
        record.summary
    );
    let fallbacks = record.fallback_count();
    if fallbacks > 0 {
        line.push_str(&format!("  [{fallbacks} fallback]"));
    }
    line
}
