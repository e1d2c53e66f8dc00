//! Offline tests for mentions-db pool configuration and row types.
//! These tests do not require a live database connection.

use mentions_core::{AppConfig, Environment, Mention, Platform};
use mentions_db::{MentionFilters, MentionRow, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: Some("postgres://example".to_string()),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        tracking_path: PathBuf::from("./config/tracking.yaml"),
        cron_secret: None,
        exa_api_key: None,
        github_token: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        http_timeout_secs: 15,
        aux_timeout_secs: 5,
        fetch_timeout_secs: 30,
        user_agent: "ua".to_string(),
        fetch_cron: "0 0 */6 * * *".to_string(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn mention_filters_default_to_first_page() {
    let filters = MentionFilters::default();
    assert_eq!(filters.limit, 50);
    assert_eq!(filters.offset, 0);
    assert!(filters.platform.is_none());
    assert!(filters.topic.is_none());
}

/// Compile-time smoke test: confirm that [`MentionRow`] converts into a
/// [`Mention`] field for field. No database required.
#[test]
fn mention_row_converts_to_mention() {
    use chrono::Utc;

    let fetched_at = Utc::now();
    let row = MentionRow {
        id: 12_i64,
        platform: "reddit".to_string(),
        external_id: Some("t3_abc".to_string()),
        url: "https://www.reddit.com/r/webdev/comments/abc/".to_string(),
        title: Some("Built a widget".to_string()),
        content: None,
        author: Some("/u/maker".to_string()),
        published_at: None,
        fetched_at,
        topic: "widget".to_string(),
        score: Some(0.0),
        highlights: Some(vec!["Built a widget".to_string()]),
    };

    let mention = Mention::from(row);
    assert_eq!(mention.id, 12);
    assert_eq!(mention.platform, Platform::Reddit);
    assert_eq!(mention.external_id.as_deref(), Some("t3_abc"));
    assert_eq!(mention.fetched_at, fetched_at);
    assert_eq!(mention.highlights, ["Built a widget"]);
}
