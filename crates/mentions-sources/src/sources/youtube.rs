//! `YouTube` video search through public Invidious instances, falling back to
//! the `YouTube` search feed when every instance is down.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mentions_core::SourceId;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Deserialize;

use crate::error::SourceError;
use crate::text::{non_blank, truncate_chars};
use crate::types::{RawMention, SourceAdapter, YouTubeVideo};

use super::atom::parse_entries;
use super::{dedup_by_key, merge_subqueries, send_json, send_text};

const DEFAULT_FEED_BASE_URL: &str = "https://www.youtube.com";
const MAX_RESULTS: usize = 20;
const FEED_DESCRIPTION_MAX_CHARS: usize = 300;

pub(crate) const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Search results carry no engagement numbers.
pub(crate) fn score(_video: &YouTubeVideo) -> Option<f64> {
    Some(0.0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    description: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    published: Option<i64>,
}

impl InvidiousItem {
    fn into_video(self) -> Option<YouTubeVideo> {
        if self.kind.as_deref().is_some_and(|k| k != "video") {
            return None;
        }
        Some(YouTubeVideo {
            video_id: non_blank(self.video_id.as_deref())?,
            title: non_blank(self.title.as_deref()),
            author: non_blank(self.author.as_deref()),
            description: non_blank(self.description.as_deref()),
            published: self
                .published
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        })
    }
}

pub struct YouTubeSource {
    client: Client,
    instances: Vec<String>,
    instance_timeout: Duration,
    feed_base_url: String,
}

impl YouTubeSource {
    #[must_use]
    pub fn new(client: Client, instances: Vec<String>, instance_timeout: Duration) -> Self {
        Self {
            client,
            instances: instances
                .into_iter()
                .map(|i| i.trim_end_matches('/').to_string())
                .collect(),
            instance_timeout,
            feed_base_url: DEFAULT_FEED_BASE_URL.to_string(),
        }
    }

    /// Point the feed fallback at a different host (for testing with wiremock).
    #[must_use]
    pub fn with_feed_base_url(mut self, base_url: &str) -> Self {
        self.feed_base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn queries(topics: &[String]) -> Vec<String> {
        topics
            .iter()
            .flat_map(|topic| [format!("{topic} tutorial"), topic.clone()])
            .collect()
    }

    async fn search_instance(
        &self,
        instance: &str,
        query: &str,
    ) -> Result<Vec<YouTubeVideo>, SourceError> {
        let request = self
            .client
            .get(format!("{instance}/api/v1/search"))
            .timeout(self.instance_timeout)
            .query(&[("q", query), ("type", "video"), ("sort", "upload_date")]);
        let items: Vec<InvidiousItem> = send_json(
            request,
            SourceId::Youtube,
            &format!("invidious search '{query}' on {instance}"),
        )
        .await?;
        Ok(items
            .into_iter()
            .filter_map(InvidiousItem::into_video)
            .take(MAX_RESULTS)
            .collect())
    }

    async fn search_feed(&self, query: &str) -> Result<Vec<YouTubeVideo>, SourceError> {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
        let url = format!(
            "{}/feeds/videos.xml?search_query={encoded}",
            self.feed_base_url
        );
        let body = send_text(self.client.get(url), SourceId::Youtube).await?;

        Ok(parse_entries(&body)
            .into_iter()
            .filter_map(|entry| {
                Some(YouTubeVideo {
                    video_id: non_blank(entry.video_id.as_deref())?,
                    title: non_blank(entry.title.as_deref()),
                    author: non_blank(entry.author.as_deref()),
                    description: non_blank(entry.media_description.as_deref())
                        .map(|d| truncate_chars(&d, FEED_DESCRIPTION_MAX_CHARS)),
                    published: entry
                        .published
                        .as_deref()
                        .and_then(|p| DateTime::parse_from_rfc3339(p.trim()).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                })
            })
            .take(MAX_RESULTS)
            .collect())
    }

    /// Try each instance in order; the feed is the last resort.
    async fn search(&self, query: &str) -> Result<Vec<YouTubeVideo>, SourceError> {
        for instance in &self.instances {
            match self.search_instance(instance, query).await {
                Ok(videos) => return Ok(videos),
                Err(e) => {
                    tracing::debug!(
                        source = "youtube",
                        instance = %instance,
                        error = %e,
                        "invidious instance failed"
                    );
                }
            }
        }
        tracing::info!(source = "youtube", query, "all invidious instances failed; using search feed");
        self.search_feed(query).await
    }
}

#[async_trait]
impl SourceAdapter for YouTubeSource {
    fn id(&self) -> SourceId {
        SourceId::Youtube
    }

    async fn fetch(&self, topics: &[String]) -> Result<Vec<RawMention>, SourceError> {
        let queries = Self::queries(topics);
        let settled = join_all(
            queries
                .iter()
                .map(|query| async move { (query.clone(), self.search(query).await) }),
        )
        .await;

        let videos = merge_subqueries(SourceId::Youtube, settled)?;
        Ok(dedup_by_key(videos, |v| v.video_id.clone())
            .into_iter()
            .map(RawMention::YouTube)
            .collect())
    }
}
