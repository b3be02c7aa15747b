//! REST endpoints for submitting calculations and querying their status
//! and solutions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::JobError;
use crate::manager::JobManager;

/// Route segment for calculation resources; also used to build the
/// `problemUrl`/`statusUrl`/`solutionUrl` fields on status records.
pub const CALCULATIONS: &str = "calculations";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: JobManager,
}

/// Build the axum router for the service.
pub fn routes(manager: JobManager) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calculations", get(list_problems).post(submit))
        .route("/calculations/status", get(list_statuses))
        .route("/calculations/{id}", get(get_problem))
        .route("/calculations/{id}/status", get(get_status))
        .route("/calculations/{id}/solution", get(get_solution))
        .layer(CorsLayer::permissive())
        .with_state(AppState { manager })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "stowage"
    }))
}

async fn submit(
    State(state): State<AppState>,
    Json(request): Json<crate::model::CalculationRequest>,
) -> impl IntoResponse {
    match state.manager.submit(request).await {
        Ok(report) => {
            info!(job_id = report.id, "POST calculation");
            (StatusCode::OK, Json(serde_json::json!(report)))
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": e.to_string()})),
        ),
    }
}

async fn list_problems(State(state): State<AppState>) -> impl IntoResponse {
    let problems = state.manager.list_problems().await;
    info!(count = problems.len(), "GET calculations");
    Json(problems)
}

async fn get_problem(State(state): State<AppState>, Path(id): Path<u64>) -> impl IntoResponse {
    match state.manager.get_problem(id).await {
        Some(problem) => (StatusCode::OK, Json(serde_json::json!(problem))),
        None => not_found(id),
    }
}

async fn list_statuses(State(state): State<AppState>) -> impl IntoResponse {
    let statuses = state.manager.list_statuses().await;
    info!(count = statuses.len(), "GET statuses");
    Json(statuses)
}

async fn get_status(State(state): State<AppState>, Path(id): Path<u64>) -> impl IntoResponse {
    match state.manager.get_status(id).await {
        Some(report) => (StatusCode::OK, Json(serde_json::json!(report))),
        None => not_found(id),
    }
}

/// 404 both for unknown ids and for jobs that have no solution yet; the
/// status route tells the two apart.
async fn get_solution(State(state): State<AppState>, Path(id): Path<u64>) -> impl IntoResponse {
    match state.manager.get_solution(id).await {
        Some(solution) => (StatusCode::OK, Json(serde_json::json!(solution))),
        None => not_found(id),
    }
}

fn not_found(id: u64) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": JobError::NotFound { id }.to_string()})),
    )
}
