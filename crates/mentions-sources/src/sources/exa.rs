//! Neural web search through the Exa API.

use async_trait::async_trait;
use futures::future::join_all;
use mentions_core::{DomainPolicy, SourceId};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::types::{RawMention, SourceAdapter, WebResult};

use super::{dedup_by_key, merge_subqueries, send_json};

const DEFAULT_BASE_URL: &str = "https://api.exa.ai";
const API_KEY_VAR: &str = "EXA_API_KEY";
const RESULTS_PER_QUERY: u32 = 25;
const TEXT_MAX_CHARS: u32 = 500;

/// Exa relevance scores are already in `[0, 1]` and used as-is.
pub(crate) fn score(result: &WebResult) -> Option<f64> {
    result.score
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    search_type: &'static str,
    use_autoprompt: bool,
    num_results: u32,
    contents: Contents,
}

#[derive(Debug, Serialize)]
struct Contents {
    text: TextOptions,
    highlights: HighlightOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextOptions {
    max_characters: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HighlightOptions {
    num_sentences: u32,
    highlights_per_url: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<WebResult>,
}

/// Web search adapter. Drops first-party pages so only third-party coverage
/// and user projects on the hosted-app suffix remain.
pub struct ExaSource {
    client: Client,
    api_key: Option<String>,
    domains: DomainPolicy,
    base_url: String,
}

impl ExaSource {
    #[must_use]
    pub fn new(client: Client, api_key: Option<String>, domains: DomainPolicy) -> Self {
        Self {
            client,
            api_key,
            domains,
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
        let mut queries: Vec<String> = topics
            .iter()
            .flat_map(|topic| [topic.clone(), format!("{topic} deployed project")])
            .collect();
        if let Some(suffix) = &self.domains.hosted_app_suffix {
            queries.push(format!("check out my project {suffix} live demo"));
        }
        queries
    }

    async fn search(&self, api_key: &str, query: &str) -> Result<Vec<WebResult>, SourceError> {
        let body = SearchRequest {
            query,
            search_type: "neural",
            use_autoprompt: true,
            num_results: RESULTS_PER_QUERY,
            contents: Contents {
                text: TextOptions {
                    max_characters: TEXT_MAX_CHARS,
                },
                highlights: HighlightOptions {
                    num_sentences: 2,
                    highlights_per_url: 2,
                },
            },
        };
        let request = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", api_key)
            .json(&body);
        let response: SearchResponse =
            send_json(request, SourceId::Exa, &format!("exa search '{query}'")).await?;
        Ok(response.results)
    }

    /// Keep results whose host is third-party or a user project.
    fn is_third_party(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .is_some_and(|host| !self.domains.is_first_party(&host))
    }
}

#[async_trait]
impl SourceAdapter for ExaSource {
    fn id(&self) -> SourceId {
        SourceId::Exa
    }

    async fn fetch(&self, topics: &[String]) -> Result<Vec<RawMention>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SourceError::MissingApiKey(API_KEY_VAR))?;

        let queries = self.queries(topics);
        let settled = join_all(queries.iter().map(|query| async move {
            (query.clone(), self.search(api_key, query).await)
        }))
        .await;

        let results = merge_subqueries(SourceId::Exa, settled)?;
        let before = results.len();
        let kept: Vec<WebResult> = results
            .into_iter()
            .filter(|r| self.is_third_party(&r.url))
            .collect();
        tracing::debug!(
            source = "exa",
            dropped = before - kept.len(),
            "filtered first-party results"
        );

        Ok(dedup_by_key(kept, |r| r.url.clone())
            .into_iter()
            .map(RawMention::Web)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> DomainPolicy {
        DomainPolicy {
            hosted_app_suffix: Some("vercel.app".to_string()),
            first_party_domains: vec!["vercel.com".to_string()],
        }
    }

    #[test]
    fn query_plan_covers_topics_and_showcase() {
        let source = ExaSource::new(Client::new(), None, policy());
        let queries = source.queries(&["widget".to_string()]);
        assert_eq!(
            queries,
            [
                "widget",
                "widget deployed project",
                "check out my project vercel.app live demo"
            ]
        );
    }

    #[test]
    fn filter_keeps_user_projects_and_drops_first_party() {
        let source = ExaSource::new(Client::new(), None, policy());
        assert!(source.is_third_party("https://my-app.vercel.app/"));
        assert!(source.is_third_party("https://blog.example.com/post"));
        assert!(!source.is_third_party("https://vercel.com/blog/x"));
        assert!(!source.is_third_party("https://vercel.app"));
        assert!(!source.is_third_party("not a url"));
    }
}
