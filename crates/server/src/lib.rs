//! ProjectRAG HTTP server
//!
//! Actix-web routes for the indexing trigger, streamed chat, search and health

pub mod routes;
pub mod state;
pub mod types;


use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use projectrag_common::{AppConfig, Result};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use routes::configure;
pub use state::AppState;

/// Connect collaborators and serve until shutdown
pub async fn start_server(config: AppConfig) -> Result<()> {
    let bind_address = config.server_bind_address();
    let state = web::Data::new(Arc::new(AppState::new(config).await?));

    info!("HTTP server listening on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("HTTP server stopped");
    Ok(())
}
