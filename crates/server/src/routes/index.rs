use actix_web::{post, web, HttpResponse};
use tracing::info;

use crate::routes::error_response;
use crate::state::AppState;
use crate::types::IndexResponse;

/// Rebuild the vector index from the project store
#[post("/index")]
pub async fn run_index(
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    info!("Indexing run requested");

    match state.indexer.run().await {
        Ok(report) => Ok(HttpResponse::Ok().json(IndexResponse {
            success: true,
            message: format!("Indexed {} projects", report.processed),
            count: report.processed,
            skipped: report.skipped,
        })),
        Err(e) => Ok(error_response("Failed to index projects", &e)),
    }
}
