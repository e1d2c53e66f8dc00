//! Dev.to articles by tag, plus a recent-top sweep filtered locally.

use async_trait::async_trait;
use futures::future::join_all;
use mentions_core::SourceId;
use reqwest::Client;

use crate::error::SourceError;
use crate::types::{DevToArticle, RawMention, SourceAdapter};

use super::{dedup_by_key, merge_subqueries, send_json};

const DEFAULT_BASE_URL: &str = "https://dev.to/api";
const REACTIONS_PER_UNIT: f64 = 50.0;

/// Positive reactions scaled down by 50.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn score(article: &DevToArticle) -> Option<f64> {
    Some(article.positive_reactions_count as f64 / REACTIONS_PER_UNIT)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ArticleQuery {
    /// Top articles of the last week carrying this tag.
    Tag(String),
    /// Top articles of the last month, matched against topics locally.
    RecentTop,
}

impl ArticleQuery {
    fn params(&self) -> Vec<(&str, &str)> {
        match self {
            ArticleQuery::Tag(tag) => vec![("tag", tag.as_str()), ("per_page", "30"), ("top", "7")],
            ArticleQuery::RecentTop => vec![("per_page", "100"), ("top", "30")],
        }
    }

    fn label(&self) -> String {
        match self {
            ArticleQuery::Tag(tag) => format!("tag:{tag}"),
            ArticleQuery::RecentTop => "recent-top".to_string(),
        }
    }
}

/// Dev.to tags are lowercase alphanumerics.
fn tag_slug(topic: &str) -> String {
    topic
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn mentions_any_topic(article: &DevToArticle, topics: &[String]) -> bool {
    let haystack = [
        article.title.to_lowercase(),
        article.description.as_deref().unwrap_or_default().to_lowercase(),
        article.tag_list.join(" ").to_lowercase(),
    ]
    .join(" ");
    topics
        .iter()
        .any(|topic| haystack.contains(&topic.to_lowercase()))
}

pub struct DevToSource {
    client: Client,
    base_url: String,
}

impl DevToSource {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at a different API root (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn queries(topics: &[String]) -> Vec<ArticleQuery> {
        let tags: Vec<ArticleQuery> = topics
            .iter()
            .map(|t| tag_slug(t))
            .filter(|slug| !slug.is_empty())
            .map(ArticleQuery::Tag)
            .collect();
        let mut queries = dedup_by_key(tags, Clone::clone);
        if !topics.is_empty() {
            queries.push(ArticleQuery::RecentTop);
        }
        queries
    }

    async fn search(
        &self,
        query: &ArticleQuery,
        topics: &[String],
    ) -> Result<Vec<DevToArticle>, SourceError> {
        let request = self
            .client
            .get(format!("{}/articles", self.base_url))
            .query(&query.params());
        let articles: Vec<DevToArticle> = send_json(
            request,
            SourceId::Devto,
            &format!("devto articles {}", query.label()),
        )
        .await?;

        Ok(match query {
            ArticleQuery::Tag(_) => articles,
            ArticleQuery::RecentTop => articles
                .into_iter()
                .filter(|a| mentions_any_topic(a, topics))
                .collect(),
        })
    }
}

#[async_trait]
impl SourceAdapter for DevToSource {
    fn id(&self) -> SourceId {
        SourceId::Devto
    }

    async fn fetch(&self, topics: &[String]) -> Result<Vec<RawMention>, SourceError> {
        let queries = Self::queries(topics);
        let settled = join_all(
            queries
                .iter()
                .map(|query| async move { (query.label(), self.search(query, topics).await) }),
        )
        .await;

        let articles = merge_subqueries(SourceId::Devto, settled)?;
        Ok(dedup_by_key(articles, |a| a.id)
            .into_iter()
            .map(RawMention::DevTo)
            .collect())
    }
}
