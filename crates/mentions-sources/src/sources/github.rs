//! Repositories mentioning a topic in their README, via GitHub search.

use async_trait::async_trait;
use futures::future::join_all;
use mentions_core::SourceId;
use reqwest::Client;
use serde::Deserialize;

use crate::error::SourceError;
use crate::types::{GitHubRepo, RawMention, SourceAdapter};

use super::{dedup_by_key, merge_subqueries, send_json};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const PER_PAGE: &str = "30";
const STARS_PER_UNIT: f64 = 100.0;

/// Stars scaled down by 100.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn score(repo: &GitHubRepo) -> Option<f64> {
    Some(repo.stargazers_count as f64 / STARS_PER_UNIT)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<GitHubRepo>,
}

/// GitHub repository search. Works unauthenticated; a token only raises the
/// rate limit.
pub struct GitHubSource {
    client: Client,
    token: Option<String>,
    hosted_app_suffix: Option<String>,
    base_url: String,
}

impl GitHubSource {
    #[must_use]
    pub fn new(client: Client, token: Option<String>, hosted_app_suffix: Option<String>) -> Self {
        Self {
            client,
            token,
            hosted_app_suffix,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at a different API root (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn queries(&self, topics: &[String]) -> Vec<String> {
        topics
            .iter()
            .map(|topic| format!("{topic} in:readme stars:>5"))
            .chain(
                self.hosted_app_suffix
                    .iter()
                    .map(|suffix| format!("{suffix} in:readme stars:>10")),
            )
            .collect()
    }

    async fn search(&self, query: &str) -> Result<Vec<GitHubRepo>, SourceError> {
        let mut request = self
            .client
            .get(format!("{}/search/repositories", self.base_url))
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", query),
                ("sort", "updated"),
                ("order", "desc"),
                ("per_page", PER_PAGE),
            ]);
        if let Some(token) = self.token.as_deref().filter(|t| !t.trim().is_empty()) {
            request = request.bearer_auth(token);
        }
        let response: SearchResponse =
            send_json(request, SourceId::Github, &format!("github search '{query}'")).await?;
        Ok(response.items)
    }
}

#[async_trait]
impl SourceAdapter for GitHubSource {
    fn id(&self) -> SourceId {
        SourceId::Github
    }

    async fn fetch(&self, topics: &[String]) -> Result<Vec<RawMention>, SourceError> {
        let queries = self.queries(topics);
        let settled = join_all(
            queries
                .iter()
                .map(|query| async move { (query.clone(), self.search(query).await) }),
        )
        .await;

        let repos = merge_subqueries(SourceId::Github, settled)?;
        Ok(dedup_by_key(repos, |r| r.id)
            .into_iter()
            .map(RawMention::GitHub)
            .collect())
    }
}
