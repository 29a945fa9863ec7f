//! Startup - one-time loading of the reference dataset and model
//!
//! Produces immutable handles shared by every request. A failed load is
//! recorded instead of aborting the process, so the form keeps rendering
//! with prediction disabled.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::logic::classifier::load_model;
use crate::logic::FraudClassifier;
use crate::logic::encoder::EncoderSet;
use crate::models::ReferenceDataset;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartupError {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("Dataset {path} could not be read: {reason}")]
    DatasetUnreadable { path: PathBuf, reason: String },

    #[error("Dataset {path} has no '{column}' column")]
    DatasetMissingColumn { path: PathBuf, column: &'static str },

    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model file {path} could not be read: {reason}")]
    ModelUnreadable { path: PathBuf, reason: String },

    #[error("Model file {path} is corrupt: {reason}")]
    ModelCorrupt { path: PathBuf, reason: String },
}

/// Model handle plus provenance, for status reporting
#[derive(Clone)]
pub struct ModelHandle {
    pub classifier: Arc<dyn FraudClassifier>,
    pub path: PathBuf,
    pub sha256: String,
}

/// Process-wide read-only resources
#[derive(Clone, Default)]
pub struct Resources {
    pub dataset: Option<Arc<ReferenceDataset>>,
    /// Present only when encoder caching is enabled and fitting succeeded
    pub encoders: Option<Arc<EncoderSet>>,
    pub model: Option<ModelHandle>,
    pub errors: Vec<StartupError>,
}

impl Resources {
    pub fn is_ready(&self) -> bool {
        self.dataset.is_some() && self.model.is_some()
    }
}

/// Load everything the form controller needs
pub fn load(config: &Config) -> Resources {
    let mut resources = Resources::default();

    match ReferenceDataset::load(&config.dataset_path) {
        Ok(dataset) => {
            if config.cache_encoders {
                let encoders = EncoderSet::fit(&dataset);
                tracing::info!(
                    vehicle_types = encoders.vehicle_type.classes().len(),
                    lane_types = encoders.lane_type.classes().len(),
                    locations = encoders.geographical_location.classes().len(),
                    "Encoders fitted and cached"
                );
                resources.encoders = Some(Arc::new(encoders));
            }
            resources.dataset = Some(Arc::new(dataset));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load reference dataset");
            resources.errors.push(e);
        }
    }

    match load_model(&config.model_path) {
        Ok(loaded) => {
            resources.model = Some(ModelHandle {
                classifier: Arc::new(loaded.artifact),
                path: loaded.path,
                sha256: loaded.sha256,
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load model");
            resources.errors.push(e);
        }
    }

    resources
}
