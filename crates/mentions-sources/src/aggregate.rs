//! Cross-source merge: dedup by URL, recency sort, and feed statistics.

use std::collections::{HashMap, HashSet};

use mentions_core::{Mention, PlatformCount, SourceId, Stats, TopicCount};
use serde::Serialize;

/// Deduplicated, recency-ordered mentions with their statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feed {
    pub mentions: Vec<Mention>,
    pub stats: Stats,
}

/// Merge per-source mention lists in the given order.
///
/// The first mention seen for a URL wins, so earlier sources take precedence.
/// The result is sorted newest first; undated mentions go last and ties keep
/// merge order.
#[must_use]
pub fn aggregate(per_source: Vec<(SourceId, Vec<Mention>)>) -> Feed {
    let (_, mut mentions) = per_source
        .into_iter()
        .flat_map(|(_, mentions)| mentions)
        .fold(
            (HashSet::new(), Vec::new()),
            |(mut seen, mut kept): (HashSet<String>, Vec<Mention>), mention| {
                if seen.insert(mention.url.clone()) {
                    kept.push(mention);
                }
                (seen, kept)
            },
        );

    mentions.sort_by_key(|m| std::cmp::Reverse(m.recency_key()));
    let stats = compute_stats(&mentions);

    Feed { mentions, stats }
}

/// Count occurrences of each key, ordered by first appearance.
fn tally<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, i64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, i64)> = Vec::new();
    for key in keys {
        match index.get(key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key.to_string(), 1));
            }
        }
    }
    counts
}

/// Statistics for a deduplicated set. Platforms are ordered by count
/// descending (ties by first appearance); topics by first appearance.
#[must_use]
pub fn compute_stats(mentions: &[Mention]) -> Stats {
    let mut by_platform = tally(mentions.iter().map(|m| m.platform.as_str()));
    by_platform.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    let by_topic = tally(mentions.iter().map(|m| m.topic.as_str()));

    Stats {
        total: i64::try_from(mentions.len()).unwrap_or(i64::MAX),
        by_platform: by_platform
            .into_iter()
            .map(|(platform, count)| PlatformCount { platform, count })
            .collect(),
        by_topic: by_topic
            .into_iter()
            .map(|(topic, count)| TopicCount { topic, count })
            .collect(),
    }
}
