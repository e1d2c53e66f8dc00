use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use mentions_core::{FetchConfig, Mention, SourceId, Stats};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, AppState, Pagination};

#[derive(Debug, Default, Deserialize)]
pub(super) struct LiveQuery {
    /// Comma-separated topics; absent means the configured topics.
    pub topics: Option<String>,
    /// Comma-separated source ids; absent means every source, blank means none.
    pub sources: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LiveResponse {
    success: bool,
    mentions: Vec<Mention>,
    stats: Stats,
    topics: Vec<String>,
    enabled_sources: Vec<SourceId>,
    pagination: Pagination,
}

fn split_csv(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_sources(raw: Option<&str>) -> Result<Vec<SourceId>, String> {
    match raw {
        None => Ok(SourceId::ALL.to_vec()),
        Some(raw) => split_csv(raw).map(str::parse::<SourceId>).collect(),
    }
}

fn build_fetch_config(query: &LiveQuery, default_topics: &[String]) -> Result<FetchConfig, String> {
    let sources = parse_sources(query.sources.as_deref())?;
    let requested: Vec<&str> = query
        .topics
        .as_deref()
        .map(split_csv)
        .into_iter()
        .flatten()
        .collect();

    Ok(if requested.is_empty() {
        FetchConfig::new(default_topics, sources)
    } else {
        FetchConfig::new(requested, sources)
    })
}

/// Run one fetch cycle and return the merged feed without touching storage.
pub(super) async fn live_feed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LiveQuery>,
) -> Result<Json<LiveResponse>, ApiError> {
    let config = build_fetch_config(&query, &state.tracking.topics)
        .map_err(|reason| ApiError::new(req_id.0.clone(), "bad_request", reason))?;

    let pipeline = Arc::clone(&state.pipeline);
    let run_config = config.clone();
    let outcome = tokio::spawn(async move { pipeline.run(&run_config).await })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "live fetch cycle aborted");
            ApiError::new(
                req_id.0.clone(),
                "internal_error",
                format!("live fetch failed: {e}"),
            )
        })?;

    let total = outcome.feed.stats.total;
    Ok(Json(LiveResponse {
        success: true,
        mentions: outcome.feed.mentions,
        stats: outcome.feed.stats,
        topics: config.topics().to_vec(),
        enabled_sources: config.enabled_sources().to_vec(),
        pagination: Pagination {
            limit: total,
            offset: 0,
            has_more: false,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(topics: Option<&str>, sources: Option<&str>) -> LiveQuery {
        LiveQuery {
            topics: topics.map(ToString::to_string),
            sources: sources.map(ToString::to_string),
        }
    }

    #[test]
    fn absent_sources_enable_all_six() {
        let config = build_fetch_config(&query(None, None), &["widget".to_string()])
            .expect("config");
        assert_eq!(config.enabled_sources(), SourceId::ALL);
        assert_eq!(config.topics(), ["widget"]);
    }

    #[test]
    fn blank_sources_enable_none() {
        let config = build_fetch_config(&query(None, Some("")), &["widget".to_string()])
            .expect("config");
        assert!(config.is_empty());
    }

    #[test]
    fn requested_topics_replace_defaults_and_web_moves_first() {
        let config = build_fetch_config(
            &query(Some(" gadget , ,Gizmo"), Some("reddit,web")),
            &["widget".to_string()],
        )
        .expect("config");
        assert_eq!(config.topics(), ["gadget", "Gizmo"]);
        assert_eq!(config.enabled_sources(), [SourceId::Exa, SourceId::Reddit]);
    }

    #[test]
    fn unknown_source_is_rejected() {
        let err = build_fetch_config(&query(None, Some("reddit,myspace")), &[]).unwrap_err();
        assert!(err.contains("myspace"));
    }
}
