//! Axum API Server
//!
//! Thin HTTP adapter over [`PredictorHandle`]. Inference is CPU-bound, so
//! `/predict` runs it on the blocking pool.
//!
//! - `GET  /health` - liveness and model status
//! - `GET  /model-info` - model descriptor (503 until a model is loaded)
//! - `POST /predict` - plant health prediction

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::PredictError;
use crate::features::PredictionRequest;
use crate::predictor::PredictorHandle;
use crate::rules::PredictionResponse;

#[derive(Clone)]
pub struct AppState {
    pub handle: Arc<PredictorHandle>,
}

impl AppState {
    pub fn new(handle: PredictorHandle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/model-info", get(model_info))
        .route("/predict", post(predict))
        .layer(CorsLayer::permissive()) // Allow all origins (adjust for production)
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.handle.health())
}

async fn model_info(State(state): State<AppState>) -> axum::response::Response {
    match state.handle.current() {
        Some(predictor) => Json(predictor.descriptor().clone()).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "not_loaded" })),
        )
            .into_response(),
    }
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let predictor = state.handle.current().ok_or(PredictError::ModelUnavailable)?;

    let response = tokio::task::spawn_blocking(move || predictor.predict(&request))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    Ok(Json(response))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unavailable(String),
    Internal(String),
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Validation(e) => AppError::BadRequest(e.to_string()),
            PredictError::ModelUnavailable => {
                AppError::Unavailable(PredictError::ModelUnavailable.to_string())
            }
            PredictError::Inference(e) => {
                tracing::error!("Inference failed: {}", e);
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
