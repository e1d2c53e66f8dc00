use chrono::TimeZone;

use super::*;
use crate::types::{DevToUser, GitHubOwner};

fn topics() -> Vec<String> {
    vec!["widget".to_string(), "gadget".to_string()]
}

fn policy() -> DomainPolicy {
    DomainPolicy {
        hosted_app_suffix: Some("vercel.app".to_string()),
        first_party_domains: vec!["vercel.com".to_string()],
    }
}

fn fetched_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).single().expect("valid date")
}

fn run(raw: RawMention) -> Mention {
    let topics = topics();
    let domains = policy();
    let ctx = NormalizeContext {
        topics: &topics,
        domains: &domains,
        fetched_at: fetched_at(),
    };
    normalize(&raw, 7, &ctx)
}

#[test]
fn topic_matches_title_case_insensitively() {
    let topics = vec!["widget".to_string()];
    assert_eq!(assign_topic(&topics, "My Widget App"), "widget");
}

#[test]
fn topic_falls_back_to_first_configured() {
    let single = vec!["widget".to_string()];
    assert_eq!(assign_topic(&single, "Unrelated"), "widget");
    assert_eq!(assign_topic(&topics(), "all about gadgets"), "gadget");
}

#[test]
fn topic_is_unknown_without_configured_topics() {
    assert_eq!(assign_topic(&[], "anything"), UNKNOWN_TOPIC);
}

#[test]
fn detect_platform_by_host() {
    let p = policy();
    assert_eq!(detect_platform("https://x.com/a/status/1", &p), Platform::Twitter);
    assert_eq!(detect_platform("https://www.linkedin.com/posts/a", &p), Platform::Linkedin);
    assert_eq!(detect_platform("https://old.reddit.com/r/x", &p), Platform::Reddit);
    assert_eq!(detect_platform("https://youtu.be/abc", &p), Platform::Youtube);
    assert_eq!(detect_platform("https://github.com/a/b", &p), Platform::Github);
    assert_eq!(detect_platform("https://dev.to/a/b", &p), Platform::Devto);
    assert_eq!(detect_platform("https://demo.vercel.app/", &p), Platform::App);
    assert_eq!(detect_platform("https://medium.com/@a/post", &p), Platform::Blog);
    assert_eq!(detect_platform("https://notx.com/", &p), Platform::Blog);
    assert_eq!(detect_platform("garbage", &p), Platform::Blog);
}

#[test]
fn parse_timestamp_accepts_common_shapes() {
    let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single();
    assert_eq!(parse_timestamp("2024-06-01"), expected);
    assert_eq!(parse_timestamp("2024-06-01T00:00:00Z"), expected);
    assert_eq!(parse_timestamp("2024-06-01T00:00:00.000"), expected);
    assert_eq!(parse_timestamp("2024-06-01T02:00:00+02:00"), expected);
    assert_eq!(parse_timestamp("yesterday"), None);
    assert_eq!(parse_timestamp("  "), None);
}

#[test]
fn web_result_keeps_capped_highlights_and_score() {
    let mention = run(RawMention::Web(WebResult {
        url: "https://blog.example.com/post".to_string(),
        title: Some("  Gadget   review ".to_string()),
        text: Some("Body".to_string()),
        author: Some(String::new()),
        published_date: Some("2024-06-01T00:00:00.000Z".to_string()),
        score: Some(0.42),
        highlights: vec!["h".repeat(250), "  ".to_string()],
    }));

    assert_eq!(mention.id, 7);
    assert_eq!(mention.platform, Platform::Blog);
    assert_eq!(mention.title.as_deref(), Some("Gadget review"));
    assert_eq!(mention.topic, "gadget");
    assert_eq!(mention.author, None);
    assert_eq!(mention.score, Some(0.42));
    assert_eq!(mention.highlights.len(), 1);
    assert_eq!(mention.highlights[0].chars().count(), HIGHLIGHT_MAX_CHARS);
    assert_eq!(mention.fetched_at, fetched_at());
}

#[test]
fn hacker_news_comment_falls_back_to_item_page_and_title() {
    let mention = run(RawMention::HackerNews(HnHit {
        object_id: "4242".to_string(),
        comment_text: Some("I built a <i>widget</i> &amp; more".to_string()),
        points: None,
        created_at: Some("2024-06-01T00:00:00.000Z".to_string()),
        ..HnHit::default()
    }));

    assert_eq!(mention.url, "https://news.ycombinator.com/item?id=4242");
    assert_eq!(mention.title.as_deref(), Some("HN Discussion"));
    assert_eq!(mention.content.as_deref(), Some("I built a widget & more"));
    assert_eq!(mention.platform, Platform::Hackernews);
    assert_eq!(mention.external_id.as_deref(), Some("4242"));
    assert_eq!(mention.score, Some(0.0));
    assert_eq!(mention.highlights, vec!["I built a widget & more".to_string()]);
}

#[test]
fn github_repo_uses_owner_and_scaled_stars() {
    let mention = run(RawMention::GitHub(GitHubRepo {
        id: 99,
        full_name: "acme/toolkit".to_string(),
        html_url: "https://github.com/acme/toolkit".to_string(),
        description: None,
        homepage: Some("https://toolkit.vercel.app".to_string()),
        stargazers_count: 150,
        updated_at: Some("2024-05-01T10:00:00Z".to_string()),
        owner: Some(GitHubOwner {
            login: "acme".to_string(),
        }),
        topics: vec!["gadget".to_string()],
    }));

    assert_eq!(mention.author.as_deref(), Some("acme"));
    assert_eq!(mention.score, Some(1.5));
    assert_eq!(mention.topic, "gadget");
    assert_eq!(mention.external_id.as_deref(), Some("99"));
    assert!(mention.highlights.is_empty());
}

#[test]
fn devto_prefers_display_name_and_tags_drive_topic() {
    let mention = run(RawMention::DevTo(DevToArticle {
        id: 5,
        title: "Shipping fast".to_string(),
        url: "https://dev.to/a/shipping".to_string(),
        description: Some("notes".to_string()),
        published_at: Some("2024-06-02T08:00:00Z".to_string()),
        positive_reactions_count: 25,
        tag_list: vec!["gadget".to_string()],
        user: Some(DevToUser {
            name: Some("Ada".to_string()),
            username: Some("ada".to_string()),
        }),
    }));

    assert_eq!(mention.author.as_deref(), Some("Ada"));
    assert_eq!(mention.score, Some(0.5));
    assert_eq!(mention.topic, "gadget");
}

#[test]
fn youtube_video_builds_watch_url() {
    let mention = run(RawMention::YouTube(YouTubeVideo {
        video_id: "vid1".to_string(),
        title: Some("Widget tutorial".to_string()),
        ..YouTubeVideo::default()
    }));

    assert_eq!(mention.url, "https://www.youtube.com/watch?v=vid1");
    assert_eq!(mention.platform, Platform::Youtube);
    assert_eq!(mention.score, Some(0.0));
    assert_eq!(mention.published_at, None);
}

#[test]
fn reddit_post_without_date_keeps_none() {
    let mention = run(RawMention::Reddit(RedditPost {
        id: "abc".to_string(),
        url: "https://www.reddit.com/r/x/comments/abc/".to_string(),
        title: Some("Unrelated".to_string()),
        published: Some("not a date".to_string()),
        ..RedditPost::default()
    }));

    assert_eq!(mention.published_at, None);
    assert_eq!(mention.topic, "widget");
    assert_eq!(mention.external_id.as_deref(), Some("abc"));
}

#[test]
fn batch_ids_are_namespaced_by_source() {
    let topics = topics();
    let domains = policy();
    let ctx = NormalizeContext {
        topics: &topics,
        domains: &domains,
        fetched_at: fetched_at(),
    };
    let raws = vec![
        RawMention::YouTube(YouTubeVideo {
            video_id: "a".to_string(),
            ..YouTubeVideo::default()
        }),
        RawMention::YouTube(YouTubeVideo {
            video_id: "b".to_string(),
            ..YouTubeVideo::default()
        }),
    ];
    let ids: Vec<i64> = normalize_batch(SourceId::Youtube, &raws, &ctx)
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![500_001, 500_002]);
}
