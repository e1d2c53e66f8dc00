//! Mention collection for the tracker.
//!
//! Six source adapters (web search, Reddit, Hacker News, GitHub, Dev.to,
//! `YouTube`) feed a pure normalizer and a deduplicating aggregator. The
//! [`MentionPipeline`] runs the enabled adapters in parallel and isolates
//! their failures so one broken upstream never sinks a fetch cycle.

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod sources;
pub mod types;

mod text;

pub use aggregate::{aggregate, compute_stats, Feed};
pub use error::SourceError;
pub use normalize::{assign_topic, detect_platform, normalize, normalize_batch, NormalizeContext};
pub use pipeline::{FetchOutcome, MentionPipeline, SourceOutcome, SourceReport};
pub use sources::{
    build_adapters, build_client, DevToSource, ExaSource, GitHubSource, HackerNewsSource,
    RedditSource, YouTubeSource,
};
pub use types::{RawMention, SourceAdapter};
