//! Reddit search via the public Atom feeds (no OAuth).

use async_trait::async_trait;
use futures::future::join_all;
use mentions_core::SourceId;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;

use crate::error::SourceError;
use crate::text::{html_to_text, non_blank, truncate_chars};
use crate::types::{RawMention, RedditPost, SourceAdapter};

use super::atom::{parse_entries, AtomEntry};
use super::{dedup_by_key, merge_subqueries, send_text};

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
const SITE_WIDE_LIMIT: u32 = 20;
const SUBREDDIT_LIMIT: u32 = 15;
const HOSTED_APP_LIMIT: u32 = 25;
const CONTENT_MAX_CHARS: usize = 500;

/// Feeds carry no vote counts.
pub(crate) fn score(_post: &RedditPost) -> Option<f64> {
    Some(0.0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FeedQuery {
    subreddit: Option<String>,
    q: String,
    limit: u32,
}

impl FeedQuery {
    fn label(&self) -> String {
        match &self.subreddit {
            Some(sub) => format!("r/{sub}: {}", self.q),
            None => self.q.clone(),
        }
    }
}

pub struct RedditSource {
    client: Client,
    subreddits: Vec<String>,
    showcase_subreddits: Vec<String>,
    hosted_app_suffix: Option<String>,
    base_url: String,
}

impl RedditSource {
    #[must_use]
    pub fn new(
        client: Client,
        subreddits: Vec<String>,
        showcase_subreddits: Vec<String>,
        hosted_app_suffix: Option<String>,
    ) -> Self {
        Self {
            client,
            subreddits,
            showcase_subreddits,
            hosted_app_suffix,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at a different host (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn queries(&self, topics: &[String]) -> Vec<FeedQuery> {
        let per_topic = topics.iter().flat_map(|topic| {
            let site_wide = FeedQuery {
                subreddit: None,
                q: topic.clone(),
                limit: SITE_WIDE_LIMIT,
            };
            let restricted = self.subreddits.iter().map(move |sub| FeedQuery {
                subreddit: Some(sub.clone()),
                q: topic.clone(),
                limit: SUBREDDIT_LIMIT,
            });
            std::iter::once(site_wide).chain(restricted)
        });

        let showcase = self.hosted_app_suffix.iter().flat_map(|suffix| {
            let site_wide = FeedQuery {
                subreddit: None,
                q: format!(".{suffix}"),
                limit: HOSTED_APP_LIMIT,
            };
            let restricted = self.showcase_subreddits.iter().map(move |sub| FeedQuery {
                subreddit: Some(sub.clone()),
                q: suffix.clone(),
                limit: SUBREDDIT_LIMIT,
            });
            std::iter::once(site_wide).chain(restricted)
        });

        per_topic.chain(showcase).collect()
    }

    async fn search(&self, query: &FeedQuery) -> Result<Vec<RedditPost>, SourceError> {
        let limit = query.limit.to_string();
        let request = match &query.subreddit {
            Some(sub) => {
                let sub = utf8_percent_encode(sub, NON_ALPHANUMERIC);
                self.client
                    .get(format!("{}/r/{sub}/search.rss", self.base_url))
                    .query(&[
                        ("q", query.q.as_str()),
                        ("restrict_sr", "1"),
                        ("sort", "new"),
                        ("limit", limit.as_str()),
                    ])
            }
            None => self
                .client
                .get(format!("{}/search.rss", self.base_url))
                .query(&[
                    ("q", query.q.as_str()),
                    ("sort", "new"),
                    ("limit", limit.as_str()),
                ]),
        };

        let body = send_text(request, SourceId::Reddit).await?;
        Ok(parse_entries(&body)
            .into_iter()
            .filter_map(entry_to_post)
            .collect())
    }
}

/// Entries without an id or link cannot be keyed and are dropped.
fn entry_to_post(entry: AtomEntry) -> Option<RedditPost> {
    let id = entry
        .id
        .as_deref()
        .and_then(|id| id.trim().rsplit('/').find(|seg| !seg.is_empty()))
        .map(ToString::to_string)?;
    let url = non_blank(entry.link.as_deref())?;

    let content = entry
        .content
        .as_deref()
        .map(html_to_text)
        .map(|text| truncate_chars(&text, CONTENT_MAX_CHARS))
        .filter(|text| !text.is_empty());
    let author = entry
        .author
        .as_deref()
        .and_then(|name| non_blank(Some(&name.replace("/u/", ""))));

    Some(RedditPost {
        id,
        url,
        title: non_blank(entry.title.as_deref()),
        content,
        author,
        published: non_blank(entry.published.as_deref().or(entry.updated.as_deref())),
        subreddit: non_blank(entry.category.as_deref()),
    })
}

#[async_trait]
impl SourceAdapter for RedditSource {
    fn id(&self) -> SourceId {
        SourceId::Reddit
    }

    async fn fetch(&self, topics: &[String]) -> Result<Vec<RawMention>, SourceError> {
        let queries = self.queries(topics);
        let settled = join_all(
            queries
                .iter()
                .map(|query| async move { (query.label(), self.search(query).await) }),
        )
        .await;

        let posts = merge_subqueries(SourceId::Reddit, settled)?;
        Ok(dedup_by_key(posts, |p| p.id.clone())
            .into_iter()
            .map(RawMention::Reddit)
            .collect())
    }
}
