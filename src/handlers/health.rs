//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    dataset_loaded: bool,
    dataset_path: Option<String>,
    dataset_rows: usize,
    model_loaded: bool,
    model_path: Option<String>,
    model_kind: Option<&'static str>,
    model_sha256: Option<String>,
    startup_errors: Vec<String>,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let resources = state.controller.resources();

    Json(HealthResponse {
        status: if resources.is_ready() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        dataset_loaded: resources.dataset.is_some(),
        dataset_path: resources.dataset.as_ref().map(|d| d.source().display().to_string()),
        dataset_rows: resources.dataset.as_ref().map_or(0, |d| d.len()),
        model_loaded: resources.model.is_some(),
        model_path: resources.model.as_ref().map(|m| m.path.display().to_string()),
        model_kind: resources.model.as_ref().map(|m| m.classifier.kind()),
        model_sha256: resources.model.as_ref().map(|m| m.sha256.clone()),
        startup_errors: resources.errors.iter().map(|e| e.to_string()).collect(),
    })
}
