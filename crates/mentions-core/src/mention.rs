//! Canonical mention record and the fetch configuration that produces it.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic assigned when no topics are configured at all.
pub const UNKNOWN_TOPIC: &str = "unknown";

/// Where a mention was published, derived from its URL when the source does not say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Blog,
    Twitter,
    Linkedin,
    Reddit,
    Hackernews,
    Youtube,
    Github,
    Devto,
    /// A user project deployed on the hosting platform's app subdomain.
    App,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Blog => "blog",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Reddit => "reddit",
            Platform::Hackernews => "hackernews",
            Platform::Youtube => "youtube",
            Platform::Github => "github",
            Platform::Devto => "devto",
            Platform::App => "app",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blog" | "web" => Ok(Platform::Blog),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            "reddit" => Ok(Platform::Reddit),
            "hackernews" => Ok(Platform::Hackernews),
            "youtube" => Ok(Platform::Youtube),
            "github" => Ok(Platform::Github),
            "devto" => Ok(Platform::Devto),
            "app" => Ok(Platform::App),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Identifier of one source adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// Web search (Exa). Processed first whenever it is enabled.
    Exa,
    Hackernews,
    Reddit,
    Github,
    Devto,
    Youtube,
}

impl SourceId {
    pub const ALL: [SourceId; 6] = [
        SourceId::Exa,
        SourceId::Hackernews,
        SourceId::Reddit,
        SourceId::Github,
        SourceId::Devto,
        SourceId::Youtube,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::Exa => "exa",
            SourceId::Hackernews => "hackernews",
            SourceId::Reddit => "reddit",
            SourceId::Github => "github",
            SourceId::Devto => "devto",
            SourceId::Youtube => "youtube",
        }
    }

    /// Stable position used to namespace transient mention ids.
    #[must_use]
    pub fn ordinal(self) -> i64 {
        match self {
            SourceId::Exa => 0,
            SourceId::Hackernews => 1,
            SourceId::Reddit => 2,
            SourceId::Github => 3,
            SourceId::Devto => 4,
            SourceId::Youtube => 5,
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exa" | "web" => Ok(SourceId::Exa),
            "hackernews" | "hn" => Ok(SourceId::Hackernews),
            "reddit" => Ok(SourceId::Reddit),
            "github" => Ok(SourceId::Github),
            "devto" => Ok(SourceId::Devto),
            "youtube" => Ok(SourceId::Youtube),
            other => Err(format!("unknown source '{other}'")),
        }
    }
}

/// One normalized record of third-party content referencing a tracked topic.
///
/// `url` is the natural key. `score` is a per-source ranking hint and must not be
/// compared across platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: i64,
    pub platform: Platform,
    pub external_id: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub topic: String,
    pub score: Option<f64>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl Mention {
    /// Sort key for recency ordering. Undated mentions rank below every dated one.
    #[must_use]
    pub fn recency_key(&self) -> (bool, i64) {
        (
            self.published_at.is_some(),
            self.published_at.map_or(0, |t| t.timestamp_millis()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCount {
    pub platform: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: i64,
}

/// Feed statistics. Identical shape for live and persisted reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: i64,
    pub by_platform: Vec<PlatformCount>,
    pub by_topic: Vec<TopicCount>,
}

/// Topics and enabled sources for one fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    topics: Vec<String>,
    enabled_sources: Vec<SourceId>,
}

impl FetchConfig {
    /// Trims and de-duplicates topics (case-insensitively, first spelling kept) and
    /// sources. Source order is preserved except that web search moves to the front.
    #[must_use]
    pub fn new<T, S>(topics: T, sources: S) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        S: IntoIterator<Item = SourceId>,
    {
        let mut seen_topics = HashSet::new();
        let topics = topics
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .filter(|t| seen_topics.insert(t.to_lowercase()))
            .collect();

        let mut seen_sources = HashSet::new();
        let mut enabled_sources: Vec<SourceId> = sources
            .into_iter()
            .filter(|s| seen_sources.insert(*s))
            .collect();
        if let Some(pos) = enabled_sources.iter().position(|s| *s == SourceId::Exa) {
            let exa = enabled_sources.remove(pos);
            enabled_sources.insert(0, exa);
        }

        Self {
            topics,
            enabled_sources,
        }
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn enabled_sources(&self) -> &[SourceId] {
        &self.enabled_sources
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enabled_sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_ids_parse_aliases_and_round_trip() {
        for id in SourceId::ALL {
            assert_eq!(id.as_str().parse::<SourceId>(), Ok(id));
        }
        assert_eq!("web".parse::<SourceId>(), Ok(SourceId::Exa));
        assert_eq!(" Reddit ".parse::<SourceId>(), Ok(SourceId::Reddit));
        assert!("twitter".parse::<SourceId>().is_err());
    }

    #[test]
    fn fetch_config_moves_web_search_first_and_dedups() {
        let cfg = FetchConfig::new(
            ["Widget", " widget ", "", "gadget"],
            [
                SourceId::Reddit,
                SourceId::Exa,
                SourceId::Reddit,
                SourceId::Youtube,
            ],
        );
        assert_eq!(cfg.topics(), ["Widget", "gadget"]);
        assert_eq!(
            cfg.enabled_sources(),
            [SourceId::Exa, SourceId::Reddit, SourceId::Youtube]
        );
    }

    #[test]
    fn empty_source_list_is_not_an_error() {
        let cfg = FetchConfig::new(["widget"], []);
        assert!(cfg.is_empty());
    }

    #[test]
    fn stats_serialize_with_camel_case_keys() {
        let stats = Stats {
            total: 1,
            by_platform: vec![PlatformCount {
                platform: "reddit".to_string(),
                count: 1,
            }],
            by_topic: vec![],
        };
        let json = serde_json::to_value(&stats).expect("serialize");
        assert_eq!(json["byPlatform"][0]["platform"], "reddit");
        assert!(json["byTopic"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn mention_serializes_platform_lowercase() {
        let mention = Mention {
            id: 1,
            platform: Platform::Hackernews,
            external_id: None,
            url: "https://news.ycombinator.com/item?id=1".to_string(),
            title: None,
            content: None,
            author: None,
            published_at: None,
            fetched_at: Utc::now(),
            topic: "widget".to_string(),
            score: None,
            highlights: vec![],
        };
        let json = serde_json::to_value(&mention).expect("serialize");
        assert_eq!(json["platform"], "hackernews");
        assert!(json["published_at"].is_null());
        assert_eq!(mention.recency_key(), (false, 0));
    }
}
