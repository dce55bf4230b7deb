use crate::AppState;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::Responder;
use criteria_core::SubmissionId;
use criteria_queue::QueueEntry;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio_postgres::Client;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    submission_id: String,
    api_key: String,
}

/// `POST /`: the only ingestion route. Returns 200 on both a successful
/// enqueue and a bad API key — the latter is preserved from the original
/// service's behavior (see the design notes on this choice) rather than
/// leaking auth failures to the caller via status code.
pub async fn ingest(state: web::Data<AppState>, body: web::Json<IngestRequest>) -> impl Responder {
    let provided = body.api_key.as_bytes();
    let configured = state.api_key.as_bytes();
    let authorized = provided.len() == configured.len() && bool::from(provided.ct_eq(configured));

    if !authorized {
        log::warn!("rejected ingestion request: bad api key");
        return HttpResponse::Ok().finish();
    }

    let submission_id = match SubmissionId::from_str(&body.submission_id) {
        Ok(id) => id,
        Err(_) => {
            log::warn!("rejected ingestion request: malformed submission id");
            return HttpResponse::Ok().finish();
        }
    };

    let entry = QueueEntry::new(submission_id);
    if let Err(e) = state.ingress.put(&entry) {
        log::error!("failed to enqueue submission {}: {}", submission_id, e);
    }

    HttpResponse::Ok().finish()
}

pub async fn health(client: web::Data<Arc<Client>>) -> impl Responder {
    match client
        .execute("SELECT 1", &[])
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}
