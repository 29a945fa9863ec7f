//! Encoder vocabulary handler
//!
//! Exposes the classes fitted from the reference dataset, in code order.

use axum::{extract::State, Json};

use crate::logic::encoder::EncoderSet;
use crate::{AppError, AppResult, AppState};

pub async fn list(State(state): State<AppState>) -> AppResult<Json<EncoderSet>> {
    let resources = state.controller.resources();

    if let Some(cached) = resources.encoders.as_deref() {
        return Ok(Json(cached.clone()));
    }

    let dataset = resources
        .dataset
        .as_deref()
        .ok_or_else(|| AppError::ServiceUnavailable("reference dataset is not available".to_string()))?;

    Ok(Json(EncoderSet::fit(dataset)))
}
