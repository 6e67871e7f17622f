use axum::{Json, extract::Query, extract::State};
use std::sync::Arc;

use crate::search::SearchService;

use super::models::{ApiError, SearchParams, SearchResponse, SuggestParams};

pub async fn search_handler(
    State(service): State<Arc<SearchService>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = params.into_request()?;

    let page = service.search(&request).await?;

    Ok(Json(SearchResponse {
        total: page.total,
        courses: page.docs,
    }))
}

pub async fn suggest_handler(
    State(service): State<Arc<SearchService>>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let query = params.q.ok_or(ApiError::MissingParam { param: "q" })?;

    let suggestions = service.suggest(&query).await?;
    tracing::info!(
        count = suggestions.len(),
        query = %query,
        "Suggestion lookup completed"
    );

    Ok(Json(suggestions))
}

pub async fn health_handler() -> &'static str {
    "Course Search API is running!"
}
