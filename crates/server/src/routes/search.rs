use actix_web::{get, web, HttpResponse};

use crate::routes::error_response;
use crate::state::AppState;
use crate::types::{SearchQuery, SearchResponse, SearchResultItem, StatsResponse};
use projectrag_common::RagError;

/// Retrieval only: the projects a question would be grounded on
#[get("/search")]
pub async fn search(
    query: web::Query<SearchQuery>,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    if query.q.trim().is_empty() {
        return Ok(error_response(
            "Invalid search",
            &RagError::invalid_request("Query cannot be empty"),
        ));
    }

    let top_k = query.top_k.unwrap_or_else(|| state.retriever.top_k()).max(1);

    let results: Vec<SearchResultItem> = match state.retriever.search(&query.q, top_k).await {
        Ok(matches) => matches.into_iter().map(SearchResultItem::from).collect(),
        Err(e) => return Ok(error_response("Search failed", &e)),
    };

    let count = results.len();

    Ok(HttpResponse::Ok().json(SearchResponse {
        results,
        query: query.q.clone(),
        count,
    }))
}

#[get("/index/stats")]
pub async fn index_stats(
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    match state.index.stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(StatsResponse {
            total_vectors: stats.total_vector_count,
            dimension: stats.dimension,
            embedding_model: state.config.embedding_model.clone(),
        })),
        Err(e) => Ok(error_response("Failed to read index statistics", &e)),
    }
}
