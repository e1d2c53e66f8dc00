//! Source adapters and the HTTP plumbing they share.

mod atom;
pub(crate) mod devto;
pub(crate) mod exa;
pub(crate) mod github;
pub(crate) mod hackernews;
pub(crate) mod reddit;
pub(crate) mod youtube;

pub use devto::DevToSource;
pub use exa::ExaSource;
pub use github::GitHubSource;
pub use hackernews::HackerNewsSource;
pub use reddit::RedditSource;
pub use youtube::YouTubeSource;

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use mentions_core::{AppConfig, SourceId, TrackingConfig};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::types::SourceAdapter;

/// Build the shared HTTP client used by every adapter.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the client cannot be constructed.
pub fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client, SourceError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Construct all six adapters from application and tracking configuration.
///
/// Every adapter is built even when its credentials are absent; an
/// unconfigured adapter fails fast at fetch time instead.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the shared HTTP client cannot be built.
pub fn build_adapters(
    app: &AppConfig,
    tracking: &TrackingConfig,
) -> Result<Vec<Arc<dyn SourceAdapter>>, SourceError> {
    let client = build_client(&app.user_agent, app.http_timeout_secs)?;
    let suffix = tracking.hosted_app_suffix.clone();

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(ExaSource::new(
            client.clone(),
            app.exa_api_key.clone(),
            tracking.domain_policy(),
        )),
        Arc::new(HackerNewsSource::new(client.clone(), suffix.clone())),
        Arc::new(RedditSource::new(
            client.clone(),
            tracking.subreddits.clone(),
            tracking.showcase_subreddits.clone(),
            suffix.clone(),
        )),
        Arc::new(GitHubSource::new(
            client.clone(),
            app.github_token.clone(),
            suffix,
        )),
        Arc::new(DevToSource::new(client.clone())),
        Arc::new(YouTubeSource::new(
            client,
            tracking.invidious_instances.clone(),
            Duration::from_secs(app.aux_timeout_secs),
        )),
    ];

    Ok(adapters)
}

async fn send_checked(
    request: RequestBuilder,
    source_id: SourceId,
) -> Result<Response, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            source_id,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// Send `request` and decode a JSON body, mapping non-2xx to [`SourceError::Status`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    source_id: SourceId,
    context: &str,
) -> Result<T, SourceError> {
    let body = send_checked(request, source_id).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| SourceError::Decode {
        context: context.to_string(),
        source: e,
    })
}

pub(crate) async fn send_text(
    request: RequestBuilder,
    source_id: SourceId,
) -> Result<String, SourceError> {
    Ok(send_checked(request, source_id).await?.text().await?)
}

/// Merge settled sub-query results.
///
/// Failed sub-queries are logged and skipped. Returns
/// [`SourceError::AllQueriesFailed`] only when at least one query ran and none
/// succeeded.
pub(crate) fn merge_subqueries<T>(
    source_id: SourceId,
    results: Vec<(String, Result<Vec<T>, SourceError>)>,
) -> Result<Vec<T>, SourceError> {
    let attempted = results.len();
    let (items, failed) = results.into_iter().fold(
        (Vec::new(), 0_usize),
        |(mut items, failed), (query, result)| match result {
            Ok(batch) => {
                tracing::debug!(source = %source_id, query = %query, count = batch.len(), "sub-query ok");
                items.extend(batch);
                (items, failed)
            }
            Err(e) => {
                tracing::warn!(source = %source_id, query = %query, error = %e, "sub-query failed");
                (items, failed + 1)
            }
        },
    );

    if attempted > 0 && failed == attempted {
        return Err(SourceError::AllQueriesFailed {
            source_id,
            attempted,
        });
    }
    Ok(items)
}

/// Keep the first item for each key, preserving order.
pub(crate) fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    items
        .into_iter()
        .fold(
            (HashSet::new(), Vec::new()),
            |(mut seen, mut kept), item| {
                if seen.insert(key(&item)) {
                    kept.push(item);
                }
                (seen, kept)
            },
        )
        .1
}
