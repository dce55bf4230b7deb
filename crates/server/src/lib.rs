//! HTTP ingestion front-door.
//!
//! A single route, `POST /`, accepts `{submission_id, api_key}`, checks the
//! key in constant time, and enqueues the submission on the ingress queue.
//! Everything downstream — leaderboard write, concordance, originality —
//! happens off this request's thread.
mod handlers;

pub use handlers::IngestRequest;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use criteria_queue::Queue;
use std::sync::Arc;
use tokio_postgres::Client;

pub struct AppState {
    pub ingress: Arc<Queue>,
    pub api_key: String,
}

#[rustfmt::skip]
pub async fn run(
    port: u16,
    api_key: String,
    ingress: Arc<Queue>,
    client: Arc<Client>,
) -> Result<(), std::io::Error> {
    let state = web::Data::new(AppState { ingress, api_key });
    let client = web::Data::new(client);
    log::info!("starting ingestion server on port {}", port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(state.clone())
            .app_data(client.clone())
            .route("/", web::post().to(handlers::ingest))
            .route("/health", web::get().to(handlers::health))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
