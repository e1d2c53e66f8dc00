//! Hacker News stories and comments via the Algolia search API.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::future::join_all;
use mentions_core::SourceId;
use reqwest::Client;
use serde::Deserialize;

use crate::error::SourceError;
use crate::types::{HnHit, RawMention, SourceAdapter};

use super::{dedup_by_key, merge_subqueries, send_json};

const DEFAULT_BASE_URL: &str = "https://hn.algolia.com/api/v1";
const HITS_PER_PAGE: u32 = 30;
const WINDOW_DAYS: i64 = 30;
const POINTS_PER_UNIT: f64 = 100.0;

/// Item page used when a hit has no outbound URL (Ask HN, comments).
pub(crate) const ITEM_URL_PREFIX: &str = "https://news.ycombinator.com/item?id=";
pub(crate) const FALLBACK_TITLE: &str = "HN Discussion";

/// Points scaled down by 100. Comments carry no points and score zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn score(hit: &HnHit) -> Option<f64> {
    Some(hit.points.unwrap_or(0) as f64 / POINTS_PER_UNIT)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<HnHit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitKind {
    Story,
    Comment,
}

impl HitKind {
    fn tag(self) -> &'static str {
        match self {
            HitKind::Story => "story",
            HitKind::Comment => "comment",
        }
    }
}

pub struct HackerNewsSource {
    client: Client,
    hosted_app_suffix: Option<String>,
    base_url: String,
}

impl HackerNewsSource {
    #[must_use]
    pub fn new(client: Client, hosted_app_suffix: Option<String>) -> Self {
        Self {
            client,
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

    fn queries(&self, topics: &[String]) -> Vec<(String, HitKind)> {
        topics
            .iter()
            .flat_map(|t| [(t.clone(), HitKind::Story), (t.clone(), HitKind::Comment)])
            .chain(
                self.hosted_app_suffix
                    .iter()
                    .map(|suffix| (suffix.clone(), HitKind::Story)),
            )
            .collect()
    }

    async fn search(
        &self,
        query: &str,
        kind: HitKind,
        since_ts: i64,
    ) -> Result<Vec<HnHit>, SourceError> {
        let hits = HITS_PER_PAGE.to_string();
        let filter = format!("created_at_i>{since_ts}");
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("query", query),
                ("tags", kind.tag()),
                ("hitsPerPage", hits.as_str()),
                ("numericFilters", filter.as_str()),
            ]);
        let response: SearchResponse = send_json(
            request,
            SourceId::Hackernews,
            &format!("hn {} search '{query}'", kind.tag()),
        )
        .await?;
        Ok(response.hits)
    }
}

#[async_trait]
impl SourceAdapter for HackerNewsSource {
    fn id(&self) -> SourceId {
        SourceId::Hackernews
    }

    async fn fetch(&self, topics: &[String]) -> Result<Vec<RawMention>, SourceError> {
        let since_ts = (Utc::now() - Duration::days(WINDOW_DAYS)).timestamp();
        let queries = self.queries(topics);
        let settled = join_all(queries.iter().map(|(query, kind)| async move {
            (
                format!("{} {query}", kind.tag()),
                self.search(query, *kind, since_ts).await,
            )
        }))
        .await;

        let hits = merge_subqueries(SourceId::Hackernews, settled)?;
        Ok(dedup_by_key(hits, |h| h.object_id.clone())
            .into_iter()
            .map(RawMention::HackerNews)
            .collect())
    }
}
