//! HTTP API over the checkpoint service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use checkpoint_core::models::SaveAction;
use checkpoint_core::{CheckpointError, CheckpointService};

/// Error response wrapper mapping each failure kind to a status code.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] CheckpointError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CheckpointError::NotFound(_) => StatusCode::NOT_FOUND,
            CheckpointError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckpointError::UniquenessConflict(_) => StatusCode::CONFLICT,
            _ => {
                tracing::error!("Checkpoint backend error: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = json!({ "status": "error", "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub fn create_router(service: CheckpointService) -> Router {
    Router::new()
        .route("/api/v1/checkpoints", get(list_checkpoints))
        .route(
            "/api/v1/checkpoints/{name}",
            get(resume_checkpoint)
                .put(save_checkpoint)
                .patch(update_checkpoint)
                .delete(delete_checkpoint),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(service)
}

async fn list_checkpoints(State(service): State<CheckpointService>) -> Result<Response, ApiError> {
    Ok(Json(service.list()?).into_response())
}

async fn resume_checkpoint(
    State(service): State<CheckpointService>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(service.resume(&name)?).into_response())
}

async fn save_checkpoint(
    State(service): State<CheckpointService>,
    Path(name): Path<String>,
    Json(data): Json<Value>,
) -> Result<Response, ApiError> {
    let outcome = service.save(&name, &data)?;
    let status = match outcome.action {
        SaveAction::Created => StatusCode::CREATED,
        SaveAction::Updated => StatusCode::OK,
    };
    Ok((status, Json(outcome)).into_response())
}

async fn update_checkpoint(
    State(service): State<CheckpointService>,
    Path(name): Path<String>,
    Json(updates): Json<Value>,
) -> Result<Response, ApiError> {
    Ok(Json(service.update(&name, &updates)?).into_response())
}

async fn delete_checkpoint(
    State(service): State<CheckpointService>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(service.delete(&name)?).into_response())
}
