//! Feature Layout & Feature Vector
//!
//! **The layout below is a hard contract with the model artifact.**
//! Changing order or length silently breaks predictions, so artifacts that
//! declare `feature_names` are checked against `FEATURE_LAYOUT` at load time.

use serde::{Deserialize, Serialize};

use super::encoder::{EncoderSet, SENTINEL_CODE};
use crate::models::{CategoricalField, TransactionInput};

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    "transaction_amount",    // 0: passed through unchanged
    "amount_paid",           // 1: passed through unchanged
    "vehicle_type",          // 2: label code, -1 if unseen
    "lane_type",             // 3: label code, -1 if unseen
    "geographical_location", // 4: label code, -1 if unseen
];

/// Total number of features
pub const FEATURE_COUNT: usize = 5;

const _: () = assert!(FEATURE_LAYOUT.len() == FEATURE_COUNT);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}

/// User-visible warning raised while encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingWarning {
    pub field: CategoricalField,
    pub message: String,
}

/// Feature vector plus the warnings produced while building it
#[derive(Debug, Clone)]
pub struct EncodedTransaction {
    pub features: FeatureVector,
    pub warnings: Vec<EncodingWarning>,
}

/// Build the feature vector for a transaction.
///
/// Unseen categorical values encode as the sentinel. Only a geographical
/// location miss is surfaced as a warning.
pub fn build_features(input: &TransactionInput, encoders: &EncoderSet) -> EncodedTransaction {
    let mut warnings = Vec::new();

    let vehicle_type = encode_silently(encoders, CategoricalField::VehicleType, &input.vehicle_type);
    let lane_type = encode_silently(encoders, CategoricalField::LaneType, &input.lane_type);

    let geographical_location = match encoders
        .get(CategoricalField::GeographicalLocation)
        .transform(&input.geographical_location)
    {
        Ok(code) => code as f64,
        Err(e) => {
            tracing::warn!(error = %e, "Geographical location not in vocabulary");
            warnings.push(EncodingWarning {
                field: CategoricalField::GeographicalLocation,
                message: "Invalid geographical location".to_string(),
            });
            SENTINEL_CODE as f64
        }
    };

    EncodedTransaction {
        features: FeatureVector::from_values([
            input.transaction_amount,
            input.amount_paid,
            vehicle_type,
            lane_type,
            geographical_location,
        ]),
        warnings,
    }
}

fn encode_silently(encoders: &EncoderSet, field: CategoricalField, value: &str) -> f64 {
    let code = encoders.get(field).encode(value);
    if code == SENTINEL_CODE {
        tracing::debug!(field = %field, value = %value, "Unseen value encoded as sentinel");
    }
    code as f64
}
