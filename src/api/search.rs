//! Search API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::directory::{self, SearchResult};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string; blank matches nothing.
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total: usize,
}

/// GET /api/search - Name search across every location bucket.
pub async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let snapshot = state.locations.snapshot().await;
    let results = directory::search(&snapshot, &params.q);

    tracing::debug!("Search for {:?} matched {} locations", params.q, results.len());

    success(
        SearchResponse {
            query: params.q,
            total: results.len(),
            results,
        },
        revision_id,
    )
}
