use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;
use crate::scheduler::{run_collection, CollectionSummary};

use super::{map_db_error, require_pool, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CronResponse {
    success: bool,
    #[serde(flatten)]
    summary: CollectionSummary,
}

/// Run a scheduled-mode collection on demand. Guarded by the cron secret.
pub(super) async fn trigger_fetch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<CronResponse>, ApiError> {
    let pool = require_pool(&state, &req_id.0)?;
    let pipeline = Arc::clone(&state.pipeline);
    let fetch_config = state.tracking.fetch_config();

    let result =
        tokio::spawn(async move { run_collection(&pool, &pipeline, &fetch_config).await })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "scheduled fetch aborted");
                ApiError::new(
                    req_id.0.clone(),
                    "internal_error",
                    format!("scheduled fetch failed: {e}"),
                )
            })?;
    let summary = result.map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        fetched = summary.fetched,
        inserted = summary.inserted,
        updated = summary.updated,
        failed = summary.failed,
        "cron fetch complete"
    );

    Ok(Json(CronResponse {
        success: summary.failed == 0,
        summary,
    }))
}
