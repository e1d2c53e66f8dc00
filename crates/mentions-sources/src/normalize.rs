//! Conversion of source-specific raw records into canonical [`Mention`]s.
//!
//! Everything here is pure: no I/O, no clock reads. Blank strings become
//! `None` and unparsable dates become `None` rather than errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mentions_core::{DomainPolicy, Mention, Platform, SourceId, UNKNOWN_TOPIC};
use reqwest::Url;

use crate::sources::{devto, exa, github, hackernews, reddit, youtube};
use crate::text::{collapse_whitespace, html_to_text, non_blank, truncate_chars};
use crate::types::{
    DevToArticle, GitHubRepo, HnHit, RawMention, RedditPost, WebResult, YouTubeVideo,
};

/// Highlights are capped so list views stay compact.
pub const HIGHLIGHT_MAX_CHARS: usize = 200;

/// Stable per-source spacing of transient ids.
const IDS_PER_SOURCE: i64 = 100_000;

const KNOWN_HOSTS: [(&str, Platform); 9] = [
    ("twitter.com", Platform::Twitter),
    ("x.com", Platform::Twitter),
    ("linkedin.com", Platform::Linkedin),
    ("reddit.com", Platform::Reddit),
    ("news.ycombinator.com", Platform::Hackernews),
    ("youtube.com", Platform::Youtube),
    ("youtu.be", Platform::Youtube),
    ("github.com", Platform::Github),
    ("dev.to", Platform::Devto),
];

/// Inputs shared by every normalization call in one fetch cycle.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub topics: &'a [String],
    pub domains: &'a DomainPolicy,
    pub fetched_at: DateTime<Utc>,
}

/// Fields gathered from one raw record before topic assignment.
struct Draft {
    platform: Platform,
    external_id: Option<String>,
    url: String,
    title: Option<String>,
    content: Option<String>,
    author: Option<String>,
    published_at: Option<DateTime<Utc>>,
    score: Option<f64>,
    highlights: Vec<String>,
    /// Extra text searched for topics besides title and content (tags, highlights).
    topic_hints: Vec<String>,
}

/// Normalize one raw record.
#[must_use]
pub fn normalize(raw: &RawMention, id: i64, ctx: &NormalizeContext<'_>) -> Mention {
    let draft = match raw {
        RawMention::Web(r) => from_web(r, ctx.domains),
        RawMention::Reddit(p) => from_reddit(p),
        RawMention::HackerNews(h) => from_hacker_news(h),
        RawMention::GitHub(r) => from_github(r),
        RawMention::DevTo(a) => from_devto(a),
        RawMention::YouTube(v) => from_youtube(v),
    };

    let topic_text = [draft.title.as_deref(), draft.content.as_deref()]
        .into_iter()
        .flatten()
        .chain(draft.topic_hints.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    let topic = assign_topic(ctx.topics, &topic_text);

    let highlights = if draft.highlights.is_empty() {
        draft
            .content
            .as_deref()
            .map(|c| vec![truncate_chars(c, HIGHLIGHT_MAX_CHARS)])
            .unwrap_or_default()
    } else {
        draft.highlights
    };

    Mention {
        id,
        platform: draft.platform,
        external_id: draft.external_id,
        url: draft.url,
        title: draft.title,
        content: draft.content,
        author: draft.author,
        published_at: draft.published_at,
        fetched_at: ctx.fetched_at,
        topic,
        score: draft.score,
        highlights,
    }
}

/// Normalize one adapter's output, numbering mentions within the source's id range.
#[must_use]
pub fn normalize_batch(
    source: SourceId,
    raws: &[RawMention],
    ctx: &NormalizeContext<'_>,
) -> Vec<Mention> {
    let base = source.ordinal() * IDS_PER_SOURCE;
    raws.iter()
        .zip(1_i64..)
        .map(|(raw, n)| normalize(raw, base + n, ctx))
        .collect()
}

/// First configured topic found (case-insensitively) in `text`; otherwise the
/// first configured topic; otherwise [`UNKNOWN_TOPIC`].
#[must_use]
pub fn assign_topic(topics: &[String], text: &str) -> String {
    let haystack = text.to_lowercase();
    topics
        .iter()
        .find(|topic| haystack.contains(&topic.to_lowercase()))
        .or_else(|| topics.first())
        .map_or_else(|| UNKNOWN_TOPIC.to_string(), Clone::clone)
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Platform inferred from a URL's host. Anything unrecognized is a blog.
#[must_use]
pub fn detect_platform(url: &str, domains: &DomainPolicy) -> Platform {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return Platform::Blog;
    };

    if let Some((_, platform)) = KNOWN_HOSTS.iter().find(|(d, _)| host_matches(&host, d)) {
        return *platform;
    }
    if domains.is_hosted_app(&host) {
        return Platform::App;
    }
    Platform::Blog
}

/// Parse RFC 3339, naive ISO 8601 (assumed UTC) or a bare date.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_opt(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.and_then(parse_timestamp)
}

fn clean(value: Option<&str>) -> Option<String> {
    non_blank(value).map(|v| collapse_whitespace(&v))
}

fn from_web(r: &WebResult, domains: &DomainPolicy) -> Draft {
    let highlights: Vec<String> = r
        .highlights
        .iter()
        .filter_map(|h| clean(Some(h)))
        .map(|h| truncate_chars(&h, HIGHLIGHT_MAX_CHARS))
        .collect();
    Draft {
        platform: detect_platform(&r.url, domains),
        external_id: None,
        url: r.url.trim().to_string(),
        title: clean(r.title.as_deref()),
        content: clean(r.text.as_deref()),
        author: clean(r.author.as_deref()),
        published_at: parse_opt(r.published_date.as_deref()),
        score: exa::score(r),
        topic_hints: highlights.clone(),
        highlights,
    }
}

fn from_reddit(p: &RedditPost) -> Draft {
    Draft {
        platform: Platform::Reddit,
        external_id: Some(p.id.clone()),
        url: p.url.clone(),
        title: clean(p.title.as_deref()),
        content: clean(p.content.as_deref()),
        author: clean(p.author.as_deref()),
        published_at: parse_opt(p.published.as_deref()),
        score: reddit::score(p),
        highlights: Vec::new(),
        topic_hints: Vec::new(),
    }
}

fn from_hacker_news(h: &HnHit) -> Draft {
    let url = non_blank(h.url.as_deref())
        .unwrap_or_else(|| format!("{}{}", hackernews::ITEM_URL_PREFIX, h.object_id));
    let title = clean(h.title.as_deref())
        .or_else(|| clean(h.story_title.as_deref()))
        .unwrap_or_else(|| hackernews::FALLBACK_TITLE.to_string());
    let content = h
        .story_text
        .as_deref()
        .or(h.comment_text.as_deref())
        .map(html_to_text)
        .filter(|t| !t.is_empty());
    Draft {
        platform: Platform::Hackernews,
        external_id: Some(h.object_id.clone()),
        url,
        title: Some(title),
        content,
        author: clean(h.author.as_deref()),
        published_at: parse_opt(h.created_at.as_deref()),
        score: hackernews::score(h),
        highlights: Vec::new(),
        topic_hints: Vec::new(),
    }
}

fn from_github(r: &GitHubRepo) -> Draft {
    let mut topic_hints = r.topics.clone();
    topic_hints.extend(non_blank(r.homepage.as_deref()));
    Draft {
        platform: Platform::Github,
        external_id: Some(r.id.to_string()),
        url: r.html_url.clone(),
        title: clean(Some(&r.full_name)),
        content: clean(r.description.as_deref()),
        author: r.owner.as_ref().and_then(|o| clean(Some(&o.login))),
        published_at: parse_opt(r.updated_at.as_deref()),
        score: github::score(r),
        highlights: Vec::new(),
        topic_hints,
    }
}

fn from_devto(a: &DevToArticle) -> Draft {
    let author = a.user.as_ref().and_then(|u| {
        clean(u.name.as_deref()).or_else(|| clean(u.username.as_deref()))
    });
    Draft {
        platform: Platform::Devto,
        external_id: Some(a.id.to_string()),
        url: a.url.clone(),
        title: clean(Some(&a.title)),
        content: clean(a.description.as_deref()),
        author,
        published_at: parse_opt(a.published_at.as_deref()),
        score: devto::score(a),
        highlights: Vec::new(),
        topic_hints: a.tag_list.clone(),
    }
}

fn from_youtube(v: &YouTubeVideo) -> Draft {
    Draft {
        platform: Platform::Youtube,
        external_id: Some(v.video_id.clone()),
        url: format!("{}{}", youtube::WATCH_URL_PREFIX, v.video_id),
        title: clean(v.title.as_deref()),
        content: clean(v.description.as_deref()),
        author: clean(v.author.as_deref()),
        published_at: v.published,
        score: youtube::score(v),
        highlights: Vec::new(),
        topic_hints: Vec::new(),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
