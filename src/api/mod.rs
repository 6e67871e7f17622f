use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::search::SearchService;

pub mod handlers;
pub mod models;

pub fn create_router(service: Arc<SearchService>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", get(handlers::search_handler))
        .route("/api/search/suggest", get(handlers::suggest_handler))
        .route("/api/health", get(handlers::health_handler))
        .with_state(service)
        .layer(cors)
}
