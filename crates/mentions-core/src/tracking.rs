//! Tracking configuration: which topics to follow, which sources to poll, and
//! which domains count as first-party.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mention::{FetchConfig, SourceId};
use crate::ConfigError;

const DEFAULT_INVIDIOUS_INSTANCES: [&str; 3] = [
    "https://inv.nadeko.net",
    "https://invidious.nerdvpn.de",
    "https://invidious.jing.rocks",
];

/// Domain rules used by web search filtering and platform detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPolicy {
    /// Hosting platform's user-project suffix, e.g. `vercel.app`.
    pub hosted_app_suffix: Option<String>,
    /// Product-owned domains excluded from web search results.
    pub first_party_domains: Vec<String>,
}

impl DomainPolicy {
    /// True when `host` is a user subdomain of the hosted-app suffix.
    /// The bare suffix and its `www.` host are the platform's own site.
    #[must_use]
    pub fn is_hosted_app(&self, host: &str) -> bool {
        let Some(suffix) = self.hosted_app_suffix.as_deref() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let suffix = suffix.to_ascii_lowercase();
        host.strip_suffix(&suffix)
            .and_then(|prefix| prefix.strip_suffix('.'))
            .is_some_and(|sub| !sub.is_empty() && sub != "www")
    }

    /// True when `host` belongs to the product itself and must be dropped from
    /// third-party discovery.
    #[must_use]
    pub fn is_first_party(&self, host: &str) -> bool {
        if self.is_hosted_app(host) {
            return false;
        }
        let host = host.to_ascii_lowercase();
        let suffix_domain = self
            .hosted_app_suffix
            .as_deref()
            .map(str::to_ascii_lowercase);
        self.first_party_domains
            .iter()
            .map(|d| d.to_ascii_lowercase())
            .chain(suffix_domain)
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    pub topics: Vec<String>,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceId>,
    #[serde(default)]
    pub hosted_app_suffix: Option<String>,
    #[serde(default)]
    pub first_party_domains: Vec<String>,
    /// Subreddits searched once per topic.
    #[serde(default)]
    pub subreddits: Vec<String>,
    /// Subreddits where people share deployed projects; searched for the hosted-app suffix.
    #[serde(default)]
    pub showcase_subreddits: Vec<String>,
    #[serde(default = "default_invidious_instances")]
    pub invidious_instances: Vec<String>,
}

fn default_sources() -> Vec<SourceId> {
    SourceId::ALL.to_vec()
}

fn default_invidious_instances() -> Vec<String> {
    DEFAULT_INVIDIOUS_INSTANCES
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl TrackingConfig {
    /// Tracking config with only topics set; everything else defaulted.
    #[must_use]
    pub fn with_topics<T: AsRef<str>>(topics: &[T]) -> Self {
        Self {
            topics: topics.iter().map(|t| t.as_ref().to_string()).collect(),
            sources: default_sources(),
            hosted_app_suffix: None,
            first_party_domains: Vec::new(),
            subreddits: Vec::new(),
            showcase_subreddits: Vec::new(),
            invidious_instances: default_invidious_instances(),
        }
    }

    #[must_use]
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::new(&self.topics, self.sources.iter().copied())
    }

    #[must_use]
    pub fn domain_policy(&self) -> DomainPolicy {
        DomainPolicy {
            hosted_app_suffix: self.hosted_app_suffix.clone(),
            first_party_domains: self.first_party_domains.clone(),
        }
    }
}

/// Load and validate the tracking configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tracking(path: &Path) -> Result<TrackingConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TrackingFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let tracking: TrackingConfig = serde_yaml::from_str(&content)?;
    validate_tracking(&tracking)?;

    Ok(tracking)
}

fn validate_tracking(tracking: &TrackingConfig) -> Result<(), ConfigError> {
    if tracking.topics.is_empty() {
        return Err(ConfigError::Validation(
            "at least one topic is required".to_string(),
        ));
    }

    let mut seen_topics = HashSet::new();
    for topic in &tracking.topics {
        if topic.trim().is_empty() {
            return Err(ConfigError::Validation(
                "topic must be non-empty".to_string(),
            ));
        }
        if !seen_topics.insert(topic.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate topic: '{topic}'"
            )));
        }
    }

    let mut seen_sources = HashSet::new();
    for source in &tracking.sources {
        if !seen_sources.insert(*source) {
            return Err(ConfigError::Validation(format!(
                "duplicate source: '{source}'"
            )));
        }
    }

    if let Some(suffix) = &tracking.hosted_app_suffix {
        if suffix.trim().is_empty() || suffix.starts_with('.') || suffix.contains('/') {
            return Err(ConfigError::Validation(format!(
                "hosted_app_suffix must be a bare domain like 'example.app', got '{suffix}'"
            )));
        }
    }

    Ok(())
}
