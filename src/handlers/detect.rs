//! JSON detection API

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::logic::controller::SubmissionState;
use crate::logic::features::EncodingWarning;
use crate::logic::{FeatureVector, FraudLabel, SubmissionOutcome};
use crate::models::TransactionInput;
use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub submission_id: Uuid,
    pub state: SubmissionState,
    pub label: FraudLabel,
    pub message: &'static str,
    pub features: FeatureVector,
    pub warnings: Vec<EncodingWarning>,
}

/// Run one submission and return the verdict
pub async fn detect(
    State(state): State<AppState>,
    payload: Result<Json<TransactionInput>, JsonRejection>,
) -> AppResult<Json<DetectResponse>> {
    let Json(req) = payload?;
    let outcome = state.controller.submit(&req).await;
    let state = outcome.state();
    match outcome {
        SubmissionOutcome::Done {
            submission_id,
            verdict,
            warnings,
        } => Ok(Json(DetectResponse {
            submission_id,
            state,
            label: verdict.label,
            message: verdict.message,
            features: verdict.features,
            warnings,
        })),
        SubmissionOutcome::AbortedNoPrediction { error, .. } => Err(error.into()),
    }
}
