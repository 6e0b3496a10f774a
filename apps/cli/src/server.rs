//! HTTP transport for `docground serve`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use docground_core::{Orchestrator, QueryRequest};
use docground_extractor::SilentProgress;
use docground_shared::DocgroundError;

/// JSON error body returned for every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

/// Handler error carrying the status code it maps to.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<DocgroundError> for ApiError {
    fn from(err: DocgroundError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else if err.is_collaborator_failure() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            error!(%status, error = %err, "request failed");
        } else {
            warn!(%status, error = %err, "request rejected");
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("invalid request body: {}", rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Build the router with CORS and per-request tracing.
pub(crate) fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/extract", post(extract))
        .with_state(orchestrator)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %Uuid::now_v7(),
            )
        }))
}

/// Bind and serve until the process is stopped.
pub(crate) async fn serve(orchestrator: Arc<Orchestrator>, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "docground server listening");
    axum::serve(listener, router(orchestrator)).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let response = orchestrator.query(&request, &SilentProgress).await?;
    Ok(Json(response).into_response())
}

async fn extract(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let response = orchestrator.extract_only(&request, &SilentProgress).await?;
    Ok(Json(response).into_response())
}
