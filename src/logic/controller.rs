//! Form Controller
//!
//! One submission = one pass through
//! `Idle -> Validating -> {Predicting -> Done | AbortedNoPrediction} -> Idle`.
//! Nothing here mutates shared state; every submission owns its input,
//! encoders and feature vector.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

use super::classifier::FraudLabel;
use super::encoder::EncoderSet;
use super::features::{build_features, EncodingWarning, FeatureVector};
use crate::models::{MalformedAmount, TransactionForm, TransactionInput};
use crate::startup::Resources;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Validating,
    Predicting,
    Done,
    AbortedNoPrediction,
}

/// Reasons a submission ends without a prediction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{} is not a number: '{}'", .0.field, .0.value)]
    MalformedAmount(MalformedAmount),

    #[error("reference dataset is not available")]
    DatasetUnavailable,

    #[error("model is not available")]
    ModelUnavailable,
}

impl From<MalformedAmount> for SubmitError {
    fn from(err: MalformedAmount) -> Self {
        SubmitError::MalformedAmount(err)
    }
}

impl From<validator::ValidationErrors> for SubmitError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SubmitError::InvalidInput(errors.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub label: FraudLabel,
    pub message: &'static str,
    pub features: FeatureVector,
}

#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Done {
        submission_id: Uuid,
        verdict: Verdict,
        warnings: Vec<EncodingWarning>,
    },
    AbortedNoPrediction {
        submission_id: Uuid,
        error: SubmitError,
        warnings: Vec<EncodingWarning>,
    },
}

impl SubmissionOutcome {
    pub fn state(&self) -> SubmissionState {
        match self {
            SubmissionOutcome::Done { .. } => SubmissionState::Done,
            SubmissionOutcome::AbortedNoPrediction { .. } => SubmissionState::AbortedNoPrediction,
        }
    }

    pub fn submission_id(&self) -> Uuid {
        match self {
            SubmissionOutcome::Done { submission_id, .. }
            | SubmissionOutcome::AbortedNoPrediction { submission_id, .. } => *submission_id,
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            SubmissionOutcome::Done { verdict, .. } => Some(verdict),
            SubmissionOutcome::AbortedNoPrediction { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[EncodingWarning] {
        match self {
            SubmissionOutcome::Done { warnings, .. }
            | SubmissionOutcome::AbortedNoPrediction { warnings, .. } => warnings,
        }
    }

    pub fn error(&self) -> Option<&SubmitError> {
        match self {
            SubmissionOutcome::Done { .. } => None,
            SubmissionOutcome::AbortedNoPrediction { error, .. } => Some(error),
        }
    }
}

pub struct FormController {
    resources: Arc<Resources>,
    predict_delay: Duration,
}

impl FormController {
    pub fn new(resources: Arc<Resources>, predict_delay: Duration) -> Self {
        Self {
            resources,
            predict_delay,
        }
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Handle a raw form submission
    pub async fn submit_form(&self, form: &TransactionForm) -> SubmissionOutcome {
        let submission_id = Uuid::new_v4();
        let span = tracing::info_span!("submission", id = %submission_id);

        async {
            transition(SubmissionState::Idle, SubmissionState::Validating);
            match form.parse() {
                Ok(input) => self.run(submission_id, &input).await,
                Err(e) => abort(submission_id, e.into(), Vec::new()),
            }
        }
        .instrument(span)
        .await
    }

    /// Handle an already-typed submission
    pub async fn submit(&self, input: &TransactionInput) -> SubmissionOutcome {
        let submission_id = Uuid::new_v4();
        let span = tracing::info_span!("submission", id = %submission_id);

        async {
            transition(SubmissionState::Idle, SubmissionState::Validating);
            self.run(submission_id, input).await
        }
        .instrument(span)
        .await
    }

    async fn run(&self, submission_id: Uuid, input: &TransactionInput) -> SubmissionOutcome {
        if let Err(e) = input.validate() {
            return abort(submission_id, e.into(), Vec::new());
        }

        let Some(dataset) = self.resources.dataset.as_deref() else {
            return abort(submission_id, SubmitError::DatasetUnavailable, Vec::new());
        };

        let encoders: Cow<'_, EncoderSet> = match self.resources.encoders.as_deref() {
            Some(cached) => Cow::Borrowed(cached),
            None => Cow::Owned(EncoderSet::fit(dataset)),
        };

        let encoded = build_features(input, &encoders);

        let Some(model) = self.resources.model.as_ref() else {
            return abort(submission_id, SubmitError::ModelUnavailable, encoded.warnings);
        };

        transition(SubmissionState::Validating, SubmissionState::Predicting);

        if !self.predict_delay.is_zero() {
            tokio::time::sleep(self.predict_delay).await;
        }

        let label = model.classifier.predict(&encoded.features);

        tracing::info!(
            label = label as u8,
            features = ?encoded.features.as_array(),
            "Prediction complete"
        );
        transition(SubmissionState::Predicting, SubmissionState::Done);

        SubmissionOutcome::Done {
            submission_id,
            verdict: Verdict {
                label,
                message: label.message(),
                features: encoded.features,
            },
            warnings: encoded.warnings,
        }
    }
}

fn transition(from: SubmissionState, to: SubmissionState) {
    tracing::debug!(from = ?from, to = ?to, "Submission state change");
}

fn abort(
    submission_id: Uuid,
    error: SubmitError,
    warnings: Vec<EncodingWarning>,
) -> SubmissionOutcome {
    tracing::warn!(error = %error, "Submission aborted, no prediction made");
    transition(SubmissionState::Validating, SubmissionState::AbortedNoPrediction);
    SubmissionOutcome::AbortedNoPrediction {
        submission_id,
        error,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::classifier::FraudClassifier;
    use crate::models::transaction::sample_form;
    use crate::models::{HistoricalTransaction, ReferenceDataset};
    use crate::startup::ModelHandle;
    use std::sync::Mutex;
    use tokio_test::assert_ok;

    /// Returns a fixed label and records every vector it sees
    struct FixedClassifier {
        label: FraudLabel,
        seen: Mutex<Vec<FeatureVector>>,
    }

    impl FixedClassifier {
        fn new(label: FraudLabel) -> Arc<Self> {
            Arc::new(Self {
                label,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<FeatureVector> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl FraudClassifier for FixedClassifier {
        fn predict(&self, features: &FeatureVector) -> FraudLabel {
            self.seen.lock().unwrap().push(*features);
            self.label
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    fn dataset(rows: &[(&str, &str, &str)]) -> Arc<ReferenceDataset> {
        let rows = rows
            .iter()
            .map(|(v, l, g)| HistoricalTransaction {
                vehicle_type: Some(v.to_string()),
                lane_type: Some(l.to_string()),
                geographical_location: Some(g.to_string()),
            })
            .collect();
        Arc::new(ReferenceDataset::from_rows("memory", rows))
    }

    fn default_dataset() -> Arc<ReferenceDataset> {
        dataset(&[
            ("Car", "Regular", "13.05, 77.77"),
            ("Truck", "Express", "12.93, 77.61"),
        ])
    }

    fn controller(
        dataset: Option<Arc<ReferenceDataset>>,
        classifier: Option<Arc<FixedClassifier>>,
    ) -> FormController {
        let resources = Resources {
            dataset,
            encoders: None,
            model: classifier.map(|c| ModelHandle {
                classifier: c,
                path: "memory".into(),
                sha256: String::new(),
            }),
            errors: Vec::new(),
        };
        FormController::new(Arc::new(resources), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_fraud_label_message() {
        let classifier = FixedClassifier::new(FraudLabel::Fraud);
        let controller = controller(Some(default_dataset()), Some(classifier.clone()));

        let outcome = controller.submit_form(&sample_form()).await;
        assert_eq!(outcome.state(), SubmissionState::Done);
        let verdict = outcome.verdict().unwrap();
        assert_eq!(verdict.message, "Potential Fraud Detected");
        assert_eq!(classifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_no_fraud_label_message() {
        let controller = controller(
            Some(default_dataset()),
            Some(FixedClassifier::new(FraudLabel::NoFraud)),
        );

        let outcome = controller.submit_form(&sample_form()).await;
        assert_eq!(outcome.verdict().map(|v| v.message), Some("No Fraud Detected"));
        assert!(outcome.error().is_none());
    }

    #[tokio::test]
    async fn test_amounts_reach_classifier_unchanged() {
        let classifier = FixedClassifier::new(FraudLabel::NoFraud);
        let controller = controller(Some(default_dataset()), Some(classifier.clone()));

        controller.submit_form(&sample_form()).await;

        let calls = classifier.calls();
        assert_eq!(calls.len(), 1);
        // Car -> 0, Regular -> 1, "13.05, 77.77" -> 1
        assert_eq!(calls[0].as_array(), &[100.0, 100.0, 0.0, 1.0, 1.0]);
    }

    #[tokio::test]
    async fn test_unseen_vehicle_type_still_predicts() {
        let classifier = FixedClassifier::new(FraudLabel::NoFraud);
        let controller = controller(Some(default_dataset()), Some(classifier.clone()));

        let form = TransactionForm {
            vehicle_type: "Bus".to_string(),
            ..sample_form()
        };
        let outcome = controller.submit_form(&form).await;

        assert_eq!(outcome.state(), SubmissionState::Done);
        assert!(outcome.warnings().is_empty());
        assert_eq!(classifier.calls()[0].as_array()[2], -1.0);
    }

    #[tokio::test]
    async fn test_unseen_location_warns_and_predicts() {
        let controller = controller(
            Some(default_dataset()),
            Some(FixedClassifier::new(FraudLabel::Fraud)),
        );

        let form = TransactionForm {
            geographical_location: "somewhere".to_string(),
            ..sample_form()
        };
        let outcome = controller.submit_form(&form).await;

        assert_eq!(outcome.state(), SubmissionState::Done);
        assert_eq!(outcome.warnings().len(), 1);
        assert_eq!(outcome.warnings()[0].message, "Invalid geographical location");
    }

    #[tokio::test]
    async fn test_long_plate_still_predicts() {
        let classifier = FixedClassifier::new(FraudLabel::Fraud);
        let controller = controller(Some(default_dataset()), Some(classifier.clone()));

        let form = TransactionForm {
            vehicle_plate: "X".repeat(65),
            ..sample_form()
        };
        let outcome = controller.submit_form(&form).await;

        assert_eq!(outcome.state(), SubmissionState::Done);
        assert_eq!(outcome.verdict().map(|v| v.message), Some("Potential Fraud Detected"));
        assert_eq!(classifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_long_location_encodes_as_sentinel() {
        let classifier = FixedClassifier::new(FraudLabel::NoFraud);
        let controller = controller(Some(default_dataset()), Some(classifier.clone()));

        let form = TransactionForm {
            geographical_location: "1".repeat(129),
            ..sample_form()
        };
        let outcome = controller.submit_form(&form).await;

        assert_eq!(outcome.state(), SubmissionState::Done);
        assert_eq!(outcome.warnings().len(), 1);
        assert_eq!(outcome.warnings()[0].message, "Invalid geographical location");
        assert_eq!(classifier.calls()[0].as_array()[4], -1.0);
        assert_eq!(outcome.verdict().map(|v| v.message), Some("No Fraud Detected"));
    }

    #[tokio::test]
    async fn test_malformed_amount_aborts_before_classifier() {
        let classifier = FixedClassifier::new(FraudLabel::Fraud);
        let controller = controller(Some(default_dataset()), Some(classifier.clone()));

        let form = TransactionForm {
            transaction_amount: "one hundred".to_string(),
            ..sample_form()
        };
        let outcome = controller.submit_form(&form).await;

        assert_eq!(outcome.state(), SubmissionState::AbortedNoPrediction);
        assert!(matches!(outcome.error(), Some(SubmitError::MalformedAmount(_))));
        assert!(outcome.verdict().is_none());
        assert!(classifier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_option_aborts() {
        let classifier = FixedClassifier::new(FraudLabel::Fraud);
        let controller = controller(Some(default_dataset()), Some(classifier.clone()));

        let form = TransactionForm {
            vehicle_dimensions: "Huge".to_string(),
            ..sample_form()
        };
        let outcome = controller.submit_form(&form).await;

        assert!(matches!(outcome.error(), Some(SubmitError::InvalidInput(_))));
        assert!(classifier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_model_never_predicts() {
        let controller = controller(Some(default_dataset()), None);

        let outcome = controller.submit_form(&sample_form()).await;
        assert_eq!(outcome.error(), Some(&SubmitError::ModelUnavailable));
        assert!(outcome.verdict().is_none());
    }

    #[tokio::test]
    async fn test_missing_dataset_aborts() {
        let classifier = FixedClassifier::new(FraudLabel::Fraud);
        let controller = controller(None, Some(classifier.clone()));

        let outcome = controller.submit_form(&sample_form()).await;
        assert_eq!(outcome.error(), Some(&SubmitError::DatasetUnavailable));
        assert!(classifier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_cell_still_predicts() {
        let classifier = FixedClassifier::new(FraudLabel::Fraud);
        let rows = vec![
            HistoricalTransaction {
                vehicle_type: Some("Car".into()),
                lane_type: Some("Regular".into()),
                geographical_location: Some("13.05, 77.77".into()),
            },
            HistoricalTransaction {
                vehicle_type: Some("Truck".into()),
                lane_type: None,
                geographical_location: Some("13.05, 77.77".into()),
            },
        ];
        let controller = controller(
            Some(Arc::new(ReferenceDataset::from_rows("memory", rows))),
            Some(classifier.clone()),
        );

        let outcome = controller.submit_form(&sample_form()).await;
        assert_eq!(outcome.state(), SubmissionState::Done);
        // Car -> 0, Regular -> 0 (only class), "13.05, 77.77" -> 0
        assert_eq!(classifier.calls()[0].as_array(), &[100.0, 100.0, 0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_same_input_same_verdict() {
        let classifier = FixedClassifier::new(FraudLabel::Fraud);
        let controller = controller(Some(default_dataset()), Some(classifier.clone()));

        let first = controller.submit_form(&sample_form()).await;
        let second = controller.submit_form(&sample_form()).await;

        assert_ne!(first.submission_id(), second.submission_id());
        assert_eq!(
            first.verdict().map(|v| (v.label, v.features)),
            second.verdict().map(|v| (v.label, v.features))
        );
    }

    #[tokio::test]
    async fn test_cached_encoders_match_fresh_fit() {
        let dataset = default_dataset();
        let cached = Arc::new(EncoderSet::fit(&dataset));

        let classifier = FixedClassifier::new(FraudLabel::NoFraud);
        let resources = Resources {
            dataset: Some(dataset.clone()),
            encoders: Some(cached),
            model: Some(ModelHandle {
                classifier: classifier.clone(),
                path: "memory".into(),
                sha256: String::new(),
            }),
            errors: Vec::new(),
        };
        let with_cache = FormController::new(Arc::new(resources), Duration::ZERO);

        let fresh_classifier = FixedClassifier::new(FraudLabel::NoFraud);
        let fresh = controller(Some(dataset), Some(fresh_classifier.clone()));

        with_cache.submit_form(&sample_form()).await;
        fresh.submit_form(&sample_form()).await;
        assert_eq!(classifier.calls(), fresh_classifier.calls());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_before_prediction() {
        let classifier = FixedClassifier::new(FraudLabel::NoFraud);
        let resources = Resources {
            dataset: Some(default_dataset()),
            encoders: None,
            model: Some(ModelHandle {
                classifier: classifier.clone(),
                path: "memory".into(),
                sha256: String::new(),
            }),
            errors: Vec::new(),
        };
        let controller = FormController::new(Arc::new(resources), Duration::from_secs(3));

        let started = tokio::time::Instant::now();
        let outcome = controller.submit_form(&sample_form()).await;

        assert_eq!(outcome.state(), SubmissionState::Done);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_typed_submission() {
        let controller = controller(
            Some(default_dataset()),
            Some(FixedClassifier::new(FraudLabel::Fraud)),
        );
        let input = assert_ok!(sample_form().parse());

        let outcome = controller.submit(&input).await;
        assert_eq!(outcome.verdict().map(|v| v.label), Some(FraudLabel::Fraud));
    }
}
