use chrono::{DateTime, Utc};
use mentions_core::Mention;
use mentions_db::MentionFilters;

const TITLE_WIDTH: usize = 60;

fn fmt_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn display_title(mention: &Mention) -> String {
    let title = mention.title.as_deref().unwrap_or(&mention.url);
    if title.chars().count() > TITLE_WIDTH {
        format!("{}...", title.chars().take(TITLE_WIDTH).collect::<String>())
    } else {
        title.to_string()
    }
}

/// Print one page of stored mentions as a table.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_list(pool: &sqlx::PgPool, filters: &MentionFilters) -> anyhow::Result<()> {
    let mentions = mentions_db::list_mentions(pool, filters).await?;

    if mentions.is_empty() {
        println!("no mentions found; run `collect` first");
        return Ok(());
    }

    let header = format!(
        "{:<8}{:<12}{:<16}{:<12}TITLE",
        "ID", "PLATFORM", "TOPIC", "PUBLISHED"
    );
    println!("{header}");
    for mention in &mentions {
        println!(
            "{:<8}{:<12}{:<16}{:<12}{}",
            mention.id,
            mention.platform.as_str(),
            mention.topic,
            fmt_date(mention.published_at),
            display_title(mention)
        );
    }

    Ok(())
}
