//! Category Encoder
//!
//! Label encoding fitted on the reference dataset. Classes are the distinct
//! observed values sorted ascending; codes are their positions. Missing cells
//! are not a class. Refitting on the same data always reproduces the same
//! codes.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{CategoricalField, ReferenceDataset};

/// Code for a value that was never seen during fitting
pub const SENTINEL_CODE: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("value '{value}' not found in {field} vocabulary")]
    UnseenValue { field: CategoricalField, value: String },
}

/// Fitted encoder for a single categorical field
#[derive(Debug, Clone, Serialize)]
pub struct CategoryEncoder {
    field: CategoricalField,
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Fit on a column. `None` entries are missing cells and are skipped.
    pub fn fit<'a, I>(field: CategoricalField, values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut distinct = BTreeSet::new();
        let mut missing = 0usize;
        for value in values {
            match value {
                Some(value) => {
                    distinct.insert(value);
                }
                None => missing += 1,
            }
        }

        if missing > 0 {
            tracing::debug!(field = %field, missing, "Skipped missing cells while fitting");
        }

        Self {
            field,
            classes: distinct.into_iter().map(str::to_string).collect(),
        }
    }

    /// Fitted classes, in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code of `value`, or `UnseenValue` if it was not observed when fitting
    pub fn transform(&self, value: &str) -> Result<usize, EncodeError> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .map_err(|_| EncodeError::UnseenValue {
                field: self.field,
                value: value.to_string(),
            })
    }

    /// Code of `value`, or [`SENTINEL_CODE`]
    pub fn encode(&self, value: &str) -> i64 {
        self.transform(value)
            .map(|code| code as i64)
            .unwrap_or(SENTINEL_CODE)
    }
}

/// Encoders for every categorical field
#[derive(Debug, Clone, Serialize)]
pub struct EncoderSet {
    pub vehicle_type: CategoryEncoder,
    pub lane_type: CategoryEncoder,
    pub geographical_location: CategoryEncoder,
}

impl EncoderSet {
    pub fn fit(dataset: &ReferenceDataset) -> Self {
        Self {
            vehicle_type: CategoryEncoder::fit(
                CategoricalField::VehicleType,
                dataset.column(CategoricalField::VehicleType),
            ),
            lane_type: CategoryEncoder::fit(
                CategoricalField::LaneType,
                dataset.column(CategoricalField::LaneType),
            ),
            geographical_location: CategoryEncoder::fit(
                CategoricalField::GeographicalLocation,
                dataset.column(CategoricalField::GeographicalLocation),
            ),
        }
    }

    pub fn get(&self, field: CategoricalField) -> &CategoryEncoder {
        match field {
            CategoricalField::VehicleType => &self.vehicle_type,
            CategoricalField::LaneType => &self.lane_type,
            CategoricalField::GeographicalLocation => &self.geographical_location,
        }
    }
}
