//! Database operations for the `mentions` table.

use chrono::{DateTime, Utc};
use mentions_core::{Mention, Platform, PlatformCount, Stats, TopicCount};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// Filter value meaning "no filter" for platform and topic.
const ALL: &str = "all";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `mentions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MentionRow {
    pub id: i64,
    pub platform: String,
    pub external_id: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub topic: String,
    pub score: Option<f64>,
    pub highlights: Option<Vec<String>>,
}

impl From<MentionRow> for Mention {
    fn from(row: MentionRow) -> Self {
        // Rows written by older collectors may carry platforms this build no longer knows.
        let platform = row.platform.parse().unwrap_or(Platform::Blog);
        Mention {
            id: row.id,
            platform,
            external_id: row.external_id,
            url: row.url,
            title: row.title,
            content: row.content,
            author: row.author,
            published_at: row.published_at,
            fetched_at: row.fetched_at,
            topic: row.topic,
            score: row.score,
            highlights: row.highlights.unwrap_or_default(),
        }
    }
}

/// Whether an upsert created a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: bool,
}

/// Per-row tally of a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Read filters for [`list_mentions`]. `None`, blank and `"all"` mean unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionFilters {
    pub platform: Option<String>,
    pub topic: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for MentionFilters {
    fn default() -> Self {
        Self {
            platform: None,
            topic: None,
            limit: 50,
            offset: 0,
        }
    }
}

fn effective_filter(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert a mention, or merge it into the existing row with the same URL.
///
/// On conflict, `title`, `content`, `score` and `highlights` take the incoming
/// value only when it is non-null; every other column keeps the stored value.
/// An empty highlights list is written as NULL so it never clears stored ones.
/// The transient `id` on `mention` is ignored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_mention(pool: &PgPool, mention: &Mention) -> Result<UpsertOutcome, DbError> {
    let highlights: Option<&[String]> =
        (!mention.highlights.is_empty()).then_some(mention.highlights.as_slice());

    let inserted: bool = sqlx::query_scalar::<_, bool>(
        "INSERT INTO mentions \
             (platform, external_id, url, title, content, author, published_at, \
              fetched_at, topic, score, highlights) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (url) DO UPDATE SET \
             title      = COALESCE(EXCLUDED.title, mentions.title), \
             content    = COALESCE(EXCLUDED.content, mentions.content), \
             score      = COALESCE(EXCLUDED.score, mentions.score), \
             highlights = COALESCE(EXCLUDED.highlights, mentions.highlights) \
         RETURNING (xmax = 0) AS inserted",
    )
    .bind(mention.platform.as_str())
    .bind(mention.external_id.as_deref())
    .bind(&mention.url)
    .bind(mention.title.as_deref())
    .bind(mention.content.as_deref())
    .bind(mention.author.as_deref())
    .bind(mention.published_at)
    .bind(mention.fetched_at)
    .bind(&mention.topic)
    .bind(mention.score)
    .bind(highlights)
    .fetch_one(pool)
    .await?;

    Ok(UpsertOutcome { inserted })
}

/// Upsert mentions one statement at a time.
///
/// Rows are independent: a failing row is logged and counted, and the rest
/// still commit. There is no enclosing transaction.
pub async fn upsert_mentions(pool: &PgPool, mentions: &[Mention]) -> UpsertSummary {
    let mut summary = UpsertSummary::default();
    for mention in mentions {
        match upsert_mention(pool, mention).await {
            Ok(UpsertOutcome { inserted: true }) => summary.inserted += 1,
            Ok(UpsertOutcome { inserted: false }) => summary.updated += 1,
            Err(e) => {
                tracing::warn!(url = %mention.url, error = %e, "mention upsert failed");
                summary.failed += 1;
            }
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// List stored mentions, newest first with undated rows last.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_mentions(
    pool: &PgPool,
    filters: &MentionFilters,
) -> Result<Vec<Mention>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(
        "SELECT id, platform, external_id, url, title, content, author, published_at, \
                fetched_at, topic, score, highlights \
         FROM mentions \
         WHERE ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR topic = $2) \
         ORDER BY published_at DESC NULLS LAST, id ASC \
         LIMIT $3 OFFSET $4",
    )
    .bind(effective_filter(filters.platform.as_deref()))
    .bind(effective_filter(filters.topic.as_deref()))
    .bind(filters.limit)
    .bind(filters.offset.max(0))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Mention::from).collect())
}

/// Totals over the whole table, grouped by platform and by topic (count descending).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn mention_stats(pool: &PgPool) -> Result<Stats, DbError> {
    let total: i64 = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mentions")
        .fetch_one(pool)
        .await?;

    let by_platform = sqlx::query_as::<_, (String, i64)>(
        "SELECT platform, COUNT(*) AS count \
         FROM mentions \
         GROUP BY platform \
         ORDER BY count DESC, platform ASC",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(platform, count)| PlatformCount { platform, count })
    .collect();

    let by_topic = sqlx::query_as::<_, (String, i64)>(
        "SELECT topic, COUNT(*) AS count \
         FROM mentions \
         GROUP BY topic \
         ORDER BY count DESC, topic ASC",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(topic, count)| TopicCount { topic, count })
    .collect();

    Ok(Stats {
        total,
        by_platform,
        by_topic,
    })
}
