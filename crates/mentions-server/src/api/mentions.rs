use axum::{
    extract::{Query, State},
    Extension, Json,
};
use mentions_core::{Mention, Stats};
use mentions_db::MentionFilters;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, require_pool, ApiError, AppState, Pagination};

#[derive(Debug, Default, Deserialize)]
pub(super) struct MentionsQuery {
    pub platform: Option<String>,
    pub topic: Option<String>,
    /// Older clients send the topic as `keyword`.
    pub keyword: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MentionsQuery {
    fn into_filters(self) -> MentionFilters {
        MentionFilters {
            platform: self.platform,
            topic: self.topic.or(self.keyword),
            limit: normalize_limit(self.limit),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct MentionsResponse {
    mentions: Vec<Mention>,
    stats: Stats,
    pagination: Pagination,
}

pub(super) async fn list_mentions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MentionsQuery>,
) -> Result<Json<MentionsResponse>, ApiError> {
    let pool = require_pool(&state, &req_id.0)?;
    let filters = query.into_filters();

    let mentions = mentions_db::list_mentions(&pool, &filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let stats = mentions_db::mention_stats(&pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let page_len = i64::try_from(mentions.len()).unwrap_or(i64::MAX);
    Ok(Json(MentionsResponse {
        pagination: Pagination {
            limit: filters.limit,
            offset: filters.offset,
            has_more: page_len == filters.limit,
        },
        mentions,
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_is_a_topic_alias() {
        let filters = MentionsQuery {
            keyword: Some("widget".to_string()),
            ..MentionsQuery::default()
        }
        .into_filters();
        assert_eq!(filters.topic.as_deref(), Some("widget"));
    }

    #[test]
    fn topic_wins_over_keyword() {
        let filters = MentionsQuery {
            topic: Some("gadget".to_string()),
            keyword: Some("widget".to_string()),
            ..MentionsQuery::default()
        }
        .into_filters();
        assert_eq!(filters.topic.as_deref(), Some("gadget"));
    }

    #[test]
    fn paging_is_clamped() {
        let filters = MentionsQuery {
            limit: Some(5_000),
            offset: Some(-3),
            ..MentionsQuery::default()
        }
        .into_filters();
        assert_eq!(filters.limit, 200);
        assert_eq!(filters.offset, 0);
    }
}
