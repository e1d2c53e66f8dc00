//! Source-specific raw records and the adapter contract.
//!
//! Each adapter returns [`RawMention`]s tagged with the shape its upstream
//! service produced. The normalizer is the only consumer that looks inside.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentions_core::SourceId;
use serde::Deserialize;

use crate::error::SourceError;

/// A web search hit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebResult {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// One entry of a Reddit search feed.
#[derive(Debug, Clone, Default)]
pub struct RedditPost {
    /// Last path segment of the Atom entry id.
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    /// Post body with markup removed, at most 500 characters.
    pub content: Option<String>,
    /// Author as shown in the feed, e.g. `/u/someone`.
    pub author: Option<String>,
    pub published: Option<String>,
    pub subreddit: Option<String>,
}

/// A story or comment hit from the Hacker News search API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HnHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub story_title: Option<String>,
    #[serde(default)]
    pub story_text: Option<String>,
    #[serde(default)]
    pub comment_text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

/// A repository from the GitHub repository search API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubRepo {
    pub id: i64,
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub owner: Option<GitHubOwner>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevToUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// An article from the Dev.to articles API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevToArticle {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub positive_reactions_count: i64,
    #[serde(default)]
    pub tag_list: Vec<String>,
    #[serde(default)]
    pub user: Option<DevToUser>,
}

/// A video found through an Invidious instance or the `YouTube` search feed.
#[derive(Debug, Clone, Default)]
pub struct YouTubeVideo {
    pub video_id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// A source record before normalization.
#[derive(Debug, Clone)]
pub enum RawMention {
    Web(WebResult),
    Reddit(RedditPost),
    HackerNews(HnHit),
    GitHub(GitHubRepo),
    DevTo(DevToArticle),
    YouTube(YouTubeVideo),
}

/// One upstream service that can be searched for topic mentions.
///
/// Adapters fan out their own sub-queries. A failed sub-query is logged and
/// skipped; only when every sub-query fails does `fetch` return an error.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn id(&self) -> SourceId;

    /// Search the upstream service for every topic.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the adapter is unconfigured or all of its
    /// sub-queries fail.
    async fn fetch(&self, topics: &[String]) -> Result<Vec<RawMention>, SourceError>;
}
