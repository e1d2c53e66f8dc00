//! Fetch command handlers for the CLI.
//!
//! Source failures never abort a run; they are printed as part of the
//! per-source report and the remaining sources still contribute.

use mentions_core::{AppConfig, FetchConfig, SourceId, TrackingConfig};
use mentions_sources::{MentionPipeline, SourceReport};

/// Build the fetch config for a run, letting CLI arguments override the tracking file.
///
/// # Errors
///
/// Returns an error if any source id is unknown.
pub(crate) fn fetch_config_from_args(
    tracking: &TrackingConfig,
    topics: &[String],
    sources: &[String],
) -> anyhow::Result<FetchConfig> {
    let sources: Vec<SourceId> = if sources.is_empty() {
        tracking.sources.clone()
    } else {
        sources
            .iter()
            .map(|s| s.parse::<SourceId>().map_err(anyhow::Error::msg))
            .collect::<anyhow::Result<_>>()?
    };

    Ok(if topics.is_empty() {
        FetchConfig::new(&tracking.topics, sources)
    } else {
        FetchConfig::new(topics, sources)
    })
}

fn load_pipeline(config: &AppConfig) -> anyhow::Result<(TrackingConfig, MentionPipeline)> {
    let tracking = mentions_core::load_tracking(&config.tracking_path)?;
    let pipeline = MentionPipeline::from_config(config, &tracking)?;
    Ok((tracking, pipeline))
}

fn print_reports(reports: &[SourceReport]) {
    for report in reports {
        let line = serde_json::to_string(report).unwrap_or_else(|_| report.source.to_string());
        eprintln!("source: {line}");
    }
}

/// Scheduled mode: fetch every configured source and upsert the merged feed.
///
/// # Errors
///
/// Returns an error if the tracking file cannot be loaded or the schema cannot
/// be ensured. Rows that fail to upsert are counted, not propagated.
pub(crate) async fn run_collect(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let (tracking, pipeline) = load_pipeline(config)?;
    mentions_db::ensure_schema(pool).await?;

    let outcome = pipeline.run(&tracking.fetch_config()).await;
    print_reports(&outcome.reports);

    let summary = mentions_db::upsert_mentions(pool, &outcome.feed.mentions).await;
    println!(
        "fetched {} mentions: {} inserted, {} updated, {} failed",
        outcome.feed.mentions.len(),
        summary.inserted,
        summary.updated,
        summary.failed
    );

    Ok(())
}

/// Live mode: fetch and print the merged feed as JSON.
///
/// # Errors
///
/// Returns an error if the tracking file cannot be loaded, a source id is
/// unknown, or the feed cannot be serialized.
pub(crate) async fn run_live(
    config: &AppConfig,
    topics: &[String],
    sources: &[String],
) -> anyhow::Result<()> {
    let (tracking, pipeline) = load_pipeline(config)?;
    let fetch_config = fetch_config_from_args(&tracking, topics, sources)?;

    let outcome = pipeline.run(&fetch_config).await;
    print_reports(&outcome.reports);

    println!("{}", serde_json::to_string_pretty(&outcome.feed)?);
    Ok(())
}
