//! Reference dataset model
//!
//! Historical toll transactions, loaded once at startup. Only the three
//! categorical columns matter here; every other column is ignored.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::startup::StartupError;

/// Categorical fields fed to the classifier after label encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    VehicleType,
    LaneType,
    GeographicalLocation,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::VehicleType,
        CategoricalField::LaneType,
        CategoricalField::GeographicalLocation,
    ];

    /// CSV column holding this field
    pub fn column(self) -> &'static str {
        match self {
            CategoricalField::VehicleType => "Vehicle_Type",
            CategoricalField::LaneType => "Lane_Type",
            CategoricalField::GeographicalLocation => "Geographical_Location",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One historical row. Empty cells deserialize as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalTransaction {
    #[serde(rename = "Vehicle_Type")]
    pub vehicle_type: Option<String>,
    #[serde(rename = "Lane_Type")]
    pub lane_type: Option<String>,
    #[serde(rename = "Geographical_Location")]
    pub geographical_location: Option<String>,
}

impl HistoricalTransaction {
    pub fn get(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::VehicleType => self.vehicle_type.as_deref(),
            CategoricalField::LaneType => self.lane_type.as_deref(),
            CategoricalField::GeographicalLocation => self.geographical_location.as_deref(),
        }
    }
}

/// Immutable in-memory reference table
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    source: PathBuf,
    rows: Vec<HistoricalTransaction>,
}

impl ReferenceDataset {
    pub fn from_rows(source: impl Into<PathBuf>, rows: Vec<HistoricalTransaction>) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }

    /// Load the dataset from a CSV file with a header row
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StartupError::DatasetNotFound(path.to_path_buf()),
            _ => StartupError::DatasetUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::None)
            .from_reader(file);

        let headers = rdr.headers().map_err(|e| StartupError::DatasetUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        for field in CategoricalField::ALL {
            if !headers.iter().any(|h| h == field.column()) {
                return Err(StartupError::DatasetMissingColumn {
                    path: path.to_path_buf(),
                    column: field.column(),
                });
            }
        }

        let rows = rdr
            .deserialize()
            .collect::<Result<Vec<HistoricalTransaction>, csv::Error>>()
            .map_err(|e| StartupError::DatasetUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %path.display(), rows = rows.len(), "Reference dataset loaded");

        Ok(Self::from_rows(path, rows))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Values of one categorical column, in file order
    pub fn column(&self, field: CategoricalField) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows.iter().map(move |row| row.get(field))
    }
}
