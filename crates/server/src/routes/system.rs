use actix_web::{get, web, HttpResponse};
use tracing::warn;

use crate::state::AppState;
use crate::types::HealthResponse;

/// Liveness, plus whether the generation backend answers
#[get("/health")]
pub async fn health(state: web::Data<std::sync::Arc<AppState>>) -> actix_web::Result<HttpResponse> {
    let llm_reachable = match &state.ollama {
        Some(client) => client.test_connection().await.unwrap_or_else(|e| {
            warn!("Generation backend unreachable: {}", e);
            false
        }),
        None => false,
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        llm_reachable,
        timestamp: chrono::Utc::now(),
    }))
}
