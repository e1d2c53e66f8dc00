//! Live integration tests for mentions-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/mentions-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{TimeZone, Utc};
use mentions_core::{Mention, Platform, PlatformCount, TopicCount};
use mentions_db::{
    list_mentions, mention_stats, upsert_mention, upsert_mentions, MentionFilters, UpsertSummary,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_mention(url: &str, platform: Platform, topic: &str) -> Mention {
    Mention {
        id: 1,
        platform,
        external_id: None,
        url: url.to_string(),
        title: Some("Widget launch".to_string()),
        content: Some("We shipped a widget".to_string()),
        author: Some("maker".to_string()),
        published_at: None,
        fetched_at: Utc::now(),
        topic: topic.to_string(),
        score: Some(0.5),
        highlights: vec!["shipped a widget".to_string()],
    }
}

fn dated(mut mention: Mention, day: u32) -> Mention {
    mention.published_at = Some(
        Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0)
            .single()
            .expect("valid date"),
    );
    mention
}

fn urls(mentions: &[Mention]) -> Vec<&str> {
    mentions.iter().map(|m| m.url.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Upsert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_reports_insert_then_update(pool: sqlx::PgPool) {
    let mention = make_mention("https://a.com/1", Platform::Blog, "widget");

    let first = upsert_mention(&pool, &mention).await.expect("first upsert");
    let second = upsert_mention(&pool, &mention).await.expect("second upsert");

    assert!(first.inserted);
    assert!(!second.inserted);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mentions")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_keeps_stored_values_when_incoming_is_null(pool: sqlx::PgPool) {
    let original = make_mention("https://a.com/1", Platform::Blog, "widget");
    upsert_mention(&pool, &original).await.expect("insert");

    let sparse = Mention {
        title: None,
        content: None,
        score: None,
        highlights: Vec::new(),
        author: Some("someone else".to_string()),
        ..make_mention("https://a.com/1", Platform::Reddit, "gadget")
    };
    upsert_mention(&pool, &sparse).await.expect("update");

    let stored = list_mentions(&pool, &MentionFilters::default())
        .await
        .expect("list");
    assert_eq!(stored.len(), 1);
    let row = &stored[0];
    assert_eq!(row.title.as_deref(), Some("Widget launch"));
    assert_eq!(row.content.as_deref(), Some("We shipped a widget"));
    assert_eq!(row.score, Some(0.5));
    assert_eq!(row.highlights, ["shipped a widget"]);
    // Columns outside the merge set keep the first writer's values.
    assert_eq!(row.platform, Platform::Blog);
    assert_eq!(row.author.as_deref(), Some("maker"));
    assert_eq!(row.topic, "widget");
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_overwrites_with_non_null_values(pool: sqlx::PgPool) {
    upsert_mention(&pool, &make_mention("https://a.com/1", Platform::Blog, "widget"))
        .await
        .expect("insert");

    let fresher = Mention {
        title: Some("Widget launch, updated".to_string()),
        score: Some(0.9),
        ..make_mention("https://a.com/1", Platform::Blog, "widget")
    };
    upsert_mention(&pool, &fresher).await.expect("update");

    let stored = list_mentions(&pool, &MentionFilters::default())
        .await
        .expect("list");
    assert_eq!(stored[0].title.as_deref(), Some("Widget launch, updated"));
    assert_eq!(stored[0].score, Some(0.9));
}

#[sqlx::test(migrations = "../../migrations")]
async fn batch_upsert_tallies_inserts_and_updates(pool: sqlx::PgPool) {
    let batch = vec![
        make_mention("https://a.com/1", Platform::Blog, "widget"),
        make_mention("https://a.com/2", Platform::Reddit, "widget"),
    ];
    let first = upsert_mentions(&pool, &batch).await;
    assert_eq!(
        first,
        UpsertSummary {
            inserted: 2,
            updated: 0,
            failed: 0
        }
    );

    let mut again = batch.clone();
    again.push(make_mention("https://a.com/3", Platform::Github, "gadget"));
    let second = upsert_mentions(&pool, &again).await;
    assert_eq!(
        second,
        UpsertSummary {
            inserted: 1,
            updated: 2,
            failed: 0
        }
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn batch_upsert_counts_failing_rows_and_commits_the_rest(pool: sqlx::PgPool) {
    // topic is VARCHAR(100).
    let too_long = make_mention("https://a.com/bad", Platform::Blog, &"t".repeat(200));
    let batch = vec![
        make_mention("https://a.com/1", Platform::Blog, "widget"),
        too_long,
        make_mention("https://a.com/2", Platform::Blog, "widget"),
    ];

    let summary = upsert_mentions(&pool, &batch).await;

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.failed, 1);
    let stored = list_mentions(&pool, &MentionFilters::default())
        .await
        .expect("list");
    assert_eq!(stored.len(), 2);
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_orders_newest_first_with_undated_last(pool: sqlx::PgPool) {
    let batch = vec![
        make_mention("https://a.com/undated", Platform::Blog, "widget"),
        dated(make_mention("https://a.com/old", Platform::Blog, "widget"), 1),
        dated(make_mention("https://a.com/new", Platform::Blog, "widget"), 9),
    ];
    upsert_mentions(&pool, &batch).await;

    let stored = list_mentions(&pool, &MentionFilters::default())
        .await
        .expect("list");

    assert_eq!(
        urls(&stored),
        ["https://a.com/new", "https://a.com/old", "https://a.com/undated"]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_applies_filters_and_pagination(pool: sqlx::PgPool) {
    let batch = vec![
        dated(make_mention("https://a.com/1", Platform::Reddit, "widget"), 1),
        dated(make_mention("https://a.com/2", Platform::Reddit, "gadget"), 2),
        dated(make_mention("https://a.com/3", Platform::Blog, "widget"), 3),
        dated(make_mention("https://a.com/4", Platform::Reddit, "widget"), 4),
    ];
    upsert_mentions(&pool, &batch).await;

    let reddit_widget = list_mentions(
        &pool,
        &MentionFilters {
            platform: Some("reddit".to_string()),
            topic: Some("widget".to_string()),
            ..MentionFilters::default()
        },
    )
    .await
    .expect("filtered list");
    assert_eq!(urls(&reddit_widget), ["https://a.com/4", "https://a.com/1"]);

    let all_platforms = list_mentions(
        &pool,
        &MentionFilters {
            platform: Some("all".to_string()),
            topic: None,
            limit: 2,
            offset: 1,
        },
    )
    .await
    .expect("paged list");
    assert_eq!(urls(&all_platforms), ["https://a.com/3", "https://a.com/2"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn stats_group_by_platform_and_topic(pool: sqlx::PgPool) {
    let batch = vec![
        make_mention("https://a.com/1", Platform::Reddit, "widget"),
        make_mention("https://a.com/2", Platform::Reddit, "gadget"),
        make_mention("https://a.com/3", Platform::Blog, "widget"),
        make_mention("https://a.com/4", Platform::Reddit, "widget"),
    ];
    upsert_mentions(&pool, &batch).await;

    let stats = mention_stats(&pool).await.expect("stats");

    assert_eq!(stats.total, 4);
    assert_eq!(
        stats.by_platform,
        [
            PlatformCount {
                platform: "reddit".to_string(),
                count: 3
            },
            PlatformCount {
                platform: "blog".to_string(),
                count: 1
            },
        ]
    );
    assert_eq!(
        stats.by_topic,
        [
            TopicCount {
                topic: "widget".to_string(),
                count: 3
            },
            TopicCount {
                topic: "gadget".to_string(),
                count: 1
            },
        ]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn stats_on_empty_table_are_zero(pool: sqlx::PgPool) {
    let stats = mention_stats(&pool).await.expect("stats");
    assert_eq!(stats.total, 0);
    assert!(stats.by_platform.is_empty());
    assert!(stats.by_topic.is_empty());
}
