pub mod chat;
pub mod index;
pub mod search;
pub mod system;

use actix_web::http::StatusCode;
use actix_web::{error, web, HttpResponse};
use projectrag_common::RagError;
use tracing::error;

use crate::types::ErrorResponse;

/// Maximum accepted JSON body (conversation history included)
const JSON_LIMIT: usize = 1024 * 1024;

/// Register every API route under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .service(index::run_index)
            .service(search::index_stats)
            .service(chat::chat)
            .service(search::search)
            .service(system::health),
    );
}

/// Malformed bodies become the same JSON error payload as pipeline failures
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            let response = error_response(
                "Invalid request body",
                &RagError::invalid_request(err.to_string()),
            );
            error::InternalError::from_response(err, response).into()
        })
}

/// Log `err` and turn it into a JSON error response with its status
pub fn error_response(summary: &str, err: &RagError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!("{}: {}", summary, err);
    } else {
        tracing::warn!("{}: {}", summary, err);
    }

    HttpResponse::build(status).json(ErrorResponse {
        success: false,
        error: summary.to_string(),
        details: err.to_string(),
        kind: err.kind().to_string(),
    })
}
