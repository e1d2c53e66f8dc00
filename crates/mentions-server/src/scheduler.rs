//! Scheduled collection: fetch every enabled source, then upsert into Postgres.
//!
//! The same run backs both the cron job registered here and the
//! `/api/cron/fetch` trigger.

use std::sync::Arc;

use mentions_core::FetchConfig;
use mentions_db::DbError;
use mentions_sources::MentionPipeline;
use serde::Serialize;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Counts reported by one scheduled run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Ensure the schema, run one fetch cycle and persist the merged feed.
///
/// Rows that fail to upsert are counted in `failed`; rows already written stay.
///
/// # Errors
///
/// Returns [`DbError`] if the schema cannot be ensured.
pub async fn run_collection(
    pool: &PgPool,
    pipeline: &MentionPipeline,
    fetch_config: &FetchConfig,
) -> Result<CollectionSummary, DbError> {
    mentions_db::ensure_schema(pool).await?;

    let outcome = pipeline.run(fetch_config).await;
    let fetched = outcome.feed.mentions.len();
    let upserted = mentions_db::upsert_mentions(pool, &outcome.feed.mentions).await;

    if upserted.failed > 0 {
        tracing::error!(failed = upserted.failed, "some mentions could not be persisted");
    }

    Ok(CollectionSummary {
        fetched,
        inserted: upserted.inserted,
        updated: upserted.updated,
        failed: upserted.failed,
    })
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the cron expression is invalid, the
/// job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    pipeline: Arc<MentionPipeline>,
    fetch_config: FetchConfig,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_fetch_job(&scheduler, pool, pipeline, fetch_config, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_fetch_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    pipeline: Arc<MentionPipeline>,
    fetch_config: FetchConfig,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let fetch_config = Arc::new(fetch_config);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = pool.clone();
        let pipeline = Arc::clone(&pipeline);
        let fetch_config = Arc::clone(&fetch_config);

        Box::pin(async move {
            tracing::info!("scheduler: starting mention collection");
            match run_collection(&pool, &pipeline, &fetch_config).await {
                Ok(summary) => tracing::info!(
                    fetched = summary.fetched,
                    inserted = summary.inserted,
                    updated = summary.updated,
                    failed = summary.failed,
                    "scheduler: mention collection complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: mention collection failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered mention collection job");
    Ok(())
}
