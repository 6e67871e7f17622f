use std::sync::Arc;

use course_search::api;
use course_search::config::CONFIG;
use course_search::es::EsClient;
use course_search::loader;
use course_search::search::SearchService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let es = EsClient::from_config().await?;
    es.ensure_index().await?;
    loader::load_sample_courses(&es).await?;

    let service = Arc::new(SearchService::new(es));
    let app = api::create_router(service);

    let listener = tokio::net::TcpListener::bind(&CONFIG.bind_addr).await?;
    tracing::info!("Course search API listening on {}", CONFIG.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
