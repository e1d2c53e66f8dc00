//! Fetch orchestration: run enabled adapters in parallel, normalize, merge.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use mentions_core::{AppConfig, DomainPolicy, FetchConfig, Mention, SourceId, TrackingConfig};
use serde::Serialize;

use crate::aggregate::{aggregate, Feed};
use crate::error::SourceError;
use crate::normalize::{normalize_batch, NormalizeContext};
use crate::sources::build_adapters;
use crate::types::{RawMention, SourceAdapter};

/// How one adapter's run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Fetched { count: usize },
    Failed { reason: String },
    TimedOut,
    /// Enabled in the fetch config but no adapter is registered for it.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: SourceId,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

impl SourceReport {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self.outcome, SourceOutcome::Fetched { .. })
    }
}

/// Result of one fetch cycle.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub feed: Feed,
    pub reports: Vec<SourceReport>,
}

/// Registered adapters plus the policy shared by every fetch cycle.
pub struct MentionPipeline {
    adapters: HashMap<SourceId, Arc<dyn SourceAdapter>>,
    domains: DomainPolicy,
    fetch_timeout: Duration,
}

impl MentionPipeline {
    #[must_use]
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        domains: DomainPolicy,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            adapters: adapters.into_iter().map(|a| (a.id(), a)).collect(),
            domains,
            fetch_timeout,
        }
    }

    /// Build the pipeline with the six production adapters.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the shared HTTP client cannot be built.
    pub fn from_config(app: &AppConfig, tracking: &TrackingConfig) -> Result<Self, SourceError> {
        Ok(Self::new(
            build_adapters(app, tracking)?,
            tracking.domain_policy(),
            Duration::from_secs(app.fetch_timeout_secs),
        ))
    }

    /// Fetch, normalize and merge mentions for one cycle.
    ///
    /// Never fails: an adapter that errors, panics or times out contributes no
    /// mentions and is recorded in [`FetchOutcome::reports`]. An empty source
    /// list returns an empty feed without calling any adapter.
    pub async fn run(&self, config: &FetchConfig) -> FetchOutcome {
        if config.is_empty() {
            return FetchOutcome::default();
        }

        let topics: Arc<[String]> = config.topics().into();
        let settled = join_all(
            config
                .enabled_sources()
                .iter()
                .map(|&source| self.run_source(source, Arc::clone(&topics))),
        )
        .await;

        let fetched_at = Utc::now();
        let ctx = NormalizeContext {
            topics: config.topics(),
            domains: &self.domains,
            fetched_at,
        };

        let mut reports = Vec::with_capacity(settled.len());
        let per_source: Vec<(SourceId, Vec<Mention>)> = settled
            .into_iter()
            .map(|(report, raws)| {
                let mentions = normalize_batch(report.source, &raws, &ctx);
                let source = report.source;
                reports.push(report);
                (source, mentions)
            })
            .collect();

        let feed = aggregate(per_source);
        let failed = reports.iter().filter(|r| r.is_failure()).count();
        tracing::info!(
            sources = reports.len(),
            failed,
            mentions = feed.mentions.len(),
            "fetch cycle complete"
        );

        FetchOutcome { feed, reports }
    }

    /// Run one adapter in its own task, bounded by the fetch timeout.
    async fn run_source(
        &self,
        source: SourceId,
        topics: Arc<[String]>,
    ) -> (SourceReport, Vec<RawMention>) {
        let Some(adapter) = self.adapters.get(&source).cloned() else {
            tracing::warn!(source = %source, "no adapter registered");
            return (
                SourceReport {
                    source,
                    outcome: SourceOutcome::Unavailable,
                },
                Vec::new(),
            );
        };

        let handle = tokio::spawn(async move { adapter.fetch(&topics).await });
        let abort = handle.abort_handle();

        let (outcome, raws) = match tokio::time::timeout(self.fetch_timeout, handle).await {
            Ok(Ok(Ok(raws))) => {
                tracing::debug!(source = %source, count = raws.len(), "source fetched");
                (SourceOutcome::Fetched { count: raws.len() }, raws)
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(source = %source, error = %e, "source failed");
                (
                    SourceOutcome::Failed {
                        reason: e.to_string(),
                    },
                    Vec::new(),
                )
            }
            Ok(Err(join_err)) => {
                tracing::warn!(source = %source, error = %join_err, "source task panicked");
                (
                    SourceOutcome::Failed {
                        reason: format!("task failed: {join_err}"),
                    },
                    Vec::new(),
                )
            }
            Err(_) => {
                abort.abort();
                tracing::warn!(
                    source = %source,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "source timed out"
                );
                (SourceOutcome::TimedOut, Vec::new())
            }
        };

        (SourceReport { source, outcome }, raws)
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
