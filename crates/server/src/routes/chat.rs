use actix_web::{post, web, HttpResponse};
use futures::StreamExt;
use tracing::{debug, error};

use crate::routes::error_response;
use crate::state::AppState;
use crate::types::ChatRequest;

/// Answer the conversation's last user question from indexed projects.
///
/// Streams plain-text chunks. Failures before generation starts return a JSON
/// error; a failure mid-stream aborts the response body.
#[post("/chat")]
pub async fn chat(
    req: web::Json<ChatRequest>,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let messages = req.into_inner().messages;
    debug!("Chat request received - {} messages", messages.len());

    let stream = match state.retriever.answer(&messages).await {
        Ok(stream) => stream,
        Err(e) => return Ok(error_response("Failed to answer question", &e)),
    };

    let body = stream.map(|chunk| {
        chunk.map(web::Bytes::from).map_err(|e| {
            error!("Chat stream failed: {}", e);
            e
        })
    });

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .streaming(body))
}
