//! HTTP API consumed by the data-entry UI.
//!
//! | Route              | Purpose                                    |
//! |--------------------|--------------------------------------------|
//! | `GET /health`      | liveness                                   |
//! | `GET /api/data`    | all service points as table rows           |
//! | `GET /api/record`  | newest record for `?globalid=`             |
//! | `POST /api/record` | validate a form and add it upstream        |
//!
//! Error bodies are always `{"error": "..."}`, optionally with extra detail
//! fields, so the UI can show the message directly.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::ServlineError;
use crate::records::{transform_features, Submission, SubmissionError};
use crate::safety::{Rejection, TextSanitizer};
use crate::upstream::FeatureService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<dyn FeatureService>,
    sanitizer: TextSanitizer,
}

impl AppState {
    pub fn new(service: Arc<dyn FeatureService>) -> Self {
        Self {
            service,
            sanitizer: TextSanitizer::new(),
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/data", get(get_data))
        .route("/api/record", get(get_record).post(post_record))
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Servline listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; shutting down");
    }
    info!("Shutdown signal received");
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> &'static str {
    "ok"
}

async fn get_data(State(state): State<AppState>) -> Response {
    match state.service.query_service_points().await {
        Ok(set) => {
            let rows = transform_features(&set);
            info!(rows = rows.len(), "Serving service point table");
            Json(rows).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch service points");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch data")
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordQuery {
    globalid: Option<String>,
}

async fn get_record(State(state): State<AppState>, Query(query): Query<RecordQuery>) -> Response {
    let Some(global_id) = query.globalid.filter(|g| !g.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "globalid query parameter required");
    };

    match state.service.latest_record(&global_id).await {
        Ok(Some(attributes)) => Json(json!({ "attributes": attributes })).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({ "attributes": {} }))).into_response(),
        Err(ServlineError::Auth(e)) => {
            warn!(error = %e, "Token request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate token")
        }
        Err(e) => {
            warn!(error = %e, global_id = %global_id, "Record query failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to query feature service",
            )
        }
    }
}

async fn post_record(State(state): State<AppState>, body: Bytes) -> Response {
    let form = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => return error_response(StatusCode::BAD_REQUEST, "No form data provided"),
    };

    let submission = match Submission::from_form(&form, &state.sanitizer) {
        Ok(s) => s,
        Err(e) => {
            log_submission_error(&e);
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    match state.service.add_record(&submission).await {
        Ok(outcome) => {
            info!(object_id = ?outcome.object_id, "Record added");
            Json(json!({
                "success": true,
                "attributes": submission,
                "objectId": outcome.object_id,
                "globalId": outcome.global_id,
            }))
            .into_response()
        }
        Err(ServlineError::Auth(e)) => {
            warn!(error = %e, "Token request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate token")
        }
        Err(ServlineError::NoAddResults { details }) => {
            warn!("Feature service returned no add results");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "No results returned from server",
                    "details": details,
                })),
            )
                .into_response()
        }
        Err(ServlineError::AddFeature { code, description }) => {
            warn!(code = ?code, description = %description, "Feature service refused record");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to add feature",
                    "code": code,
                    "description": description,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Error forwarding record submission");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to add feature",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Log a rejected submission without echoing the user's text.
fn log_submission_error(err: &SubmissionError) {
    match err {
        SubmissionError::Location(Rejection::InappropriateLanguage { category, pass }) => {
            info!(category = %category, pass = ?pass, "Location description rejected");
        }
        SubmissionError::Location(reason) => {
            info!(reason = %reason, "Location description rejected");
        }
        other => info!(reason = %other, "Submission rejected"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
