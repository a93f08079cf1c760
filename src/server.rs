use crate::app::ports::WebhookPort;
use crate::app::{DispatchReport, DispatchUseCase, QualifyOutcome, QualifyUseCase};
use crate::config::PayloadConfig;
use crate::error::LeadError;
use crate::ingest::TableFormat;
use crate::payload::{build_payload, PayloadItem};
use crate::report::RunSummary;
use axum::{
    body::Bytes,
    extract::Query,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use hyper::Server;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared state for the upload endpoints. The qualify use case owns the cache,
/// so identical uploads across requests reuse earlier results.
pub struct AppState {
    pub qualify: QualifyUseCase,
    pub webhook: Arc<dyn WebhookPort>,
}

#[derive(Debug, Deserialize)]
struct QualifyParams {
    format: Option<TableFormat>,
}

#[derive(Debug, Deserialize)]
struct DispatchParams {
    format: Option<TableFormat>,
    webhook_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
struct QualifyResponse {
    summary: RunSummary,
    rows: Vec<PayloadItem>,
}

#[derive(Debug, Serialize)]
struct DispatchResponse {
    summary: RunSummary,
    dispatch: Option<DispatchReport>,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Lead(LeadError),
    Internal(String),
}

impl From<LeadError> for ApiError {
    fn from(e: LeadError) -> Self {
        ApiError::Lead(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Lead(err) => err,
            ApiError::Internal(message) => {
                let body = serde_json::json!({ "error": message });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };
        let status = match &err {
            LeadError::MissingColumns { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LeadError::MalformedInput(_) | LeadError::Csv(_) | LeadError::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            LeadError::Transport(_) | LeadError::WebhookStatus { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut body = serde_json::json!({ "error": err.to_string() });
        if let LeadError::MissingColumns { missing } = &err {
            body["missing_columns"] = serde_json::json!(missing);
        }
        (status, Json(body)).into_response()
    }
}

/// Parses, hashes and qualifies an upload on the blocking pool so large
/// workbooks do not stall the async workers.
async fn qualify_upload(
    state: Arc<AppState>,
    body: Bytes,
    format: TableFormat,
) -> Result<QualifyOutcome, ApiError> {
    let outcome = tokio::task::spawn_blocking(move || state.qualify.run_bytes(&body, format))
        .await
        .map_err(|e| ApiError::Internal(format!("qualification task failed: {}", e)))??;
    Ok(outcome)
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "cart-recovery",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn qualify_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<QualifyParams>,
    body: Bytes,
) -> Result<Json<QualifyResponse>, ApiError> {
    let format = params.format.unwrap_or(TableFormat::Csv);
    let outcome = qualify_upload(state, body, format).await?;
    let rows = build_payload(&outcome.qualified, &PayloadConfig::default())?;
    Ok(Json(QualifyResponse { summary: outcome.summary, rows }))
}

async fn dispatch_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<DispatchParams>,
    body: Bytes,
) -> Result<Json<DispatchResponse>, ApiError> {
    let format = params.format.unwrap_or(TableFormat::Csv);
    let outcome = qualify_upload(state.clone(), body, format).await?;

    if outcome.qualified.is_empty() {
        return Ok(Json(DispatchResponse {
            summary: outcome.summary,
            dispatch: None,
            message: "No qualified leads found, nothing was sent".to_string(),
        }));
    }

    let config = state.qualify.config();
    let items = build_payload(&outcome.qualified, &config.payload)?;

    let mut dispatch_config = config.dispatch.clone();
    if let Some(url) = params.webhook_url {
        dispatch_config.destination_url = url;
    }
    if let Some(timeout) = params.timeout_seconds {
        dispatch_config.timeout_seconds = timeout;
    }

    let report = DispatchUseCase::new(state.webhook.clone(), dispatch_config)
        .dispatch(&items)
        .await?;
    let message = format!("Sent {} qualified lead(s) to the webhook", report.records_sent);
    Ok(Json(DispatchResponse { summary: outcome.summary, dispatch: Some(report), message }))
}

/// Create the HTTP server with the upload routes
pub fn create_server(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/qualify", post(qualify_handler))
        .route("/dispatch", post(dispatch_handler))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let app = create_server(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://localhost:{}", port);
    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📥 Upload:       POST http://localhost:{port}/qualify?format=csv");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
