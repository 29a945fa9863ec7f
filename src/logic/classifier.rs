//! Fraud Classifier
//!
//! Loads a pretrained model artifact and exposes it behind the
//! [`FraudClassifier`] trait so the controller never depends on a concrete
//! model family.
//!
//! Artifact layout (JSON):
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "n_features": 5,
//!   "feature_names": [...],            // optional, must match FEATURE_LAYOUT
//!   "model": { "kind": "logistic" | "decision_tree" | "random_forest", ... }
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::features::{FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};
use crate::startup::StartupError;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// LABEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FraudLabel {
    NoFraud = 0,
    Fraud = 1,
}

impl FraudLabel {
    /// Text shown to the user for this verdict
    pub fn message(self) -> &'static str {
        match self {
            FraudLabel::Fraud => "Potential Fraud Detected",
            FraudLabel::NoFraud => "No Fraud Detected",
        }
    }
}

impl From<FraudLabel> for u8 {
    fn from(label: FraudLabel) -> Self {
        label as u8
    }
}

impl TryFrom<u8> for FraudLabel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FraudLabel::NoFraud),
            1 => Ok(FraudLabel::Fraud),
            other => Err(format!("label must be 0 or 1, got {}", other)),
        }
    }
}

impl fmt::Display for FraudLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Opaque binary decision function. Implementations are immutable after
/// load and shared across concurrent requests.
pub trait FraudClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> FraudLabel;

    /// Short model family name for status reporting
    fn kind(&self) -> &'static str;
}

// ============================================================================
// ARTIFACT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub model: Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Logistic(LogisticModel),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

/// Linear decision function: fraud iff `w·x + b > 0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    fn decision_function(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        self.weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + self.intercept
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Per-class weight: `[no_fraud, fraud]`
        value: [f64; 2],
    },
}

/// Binary decision tree stored as a flat node array, root at index 0.
/// Samples go left when `x[feature] <= threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Class weights of the leaf reached by `x`
    fn leaf_value(&self, x: &[f64; FEATURE_COUNT]) -> [f64; 2] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return *value,
            }
        }
    }

    fn probabilities(&self, x: &[f64; FEATURE_COUNT]) -> [f64; 2] {
        let [a, b] = self.leaf_value(x);
        let total = a + b;
        if total > 0.0 {
            [a / total, b / total]
        } else {
            [1.0, 0.0]
        }
    }

    /// Children must point forward so traversal always terminates
    fn check(&self, tree: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {} has no nodes", tree));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!(
                            "tree {} node {}: feature index {} out of range",
                            tree, index, feature
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("tree {} node {}: non-finite threshold", tree, index));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!(
                                "tree {} node {}: invalid child index {}",
                                tree, index, child
                            ));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(format!(
                            "tree {} node {}: leaf weights must be finite and non-negative",
                            tree, index
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Average of per-tree class probabilities, argmax wins (ties go to 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

fn argmax(probabilities: [f64; 2]) -> FraudLabel {
    if probabilities[1] > probabilities[0] {
        FraudLabel::Fraud
    } else {
        FraudLabel::NoFraud
    }
}

impl ModelArtifact {
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        artifact.check()?;
        Ok(artifact)
    }

    fn check(&self) -> Result<(), String> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            ));
        }

        if self.n_features != FEATURE_COUNT {
            return Err(format!(
                "model expects {} features, layout has {}",
                self.n_features, FEATURE_COUNT
            ));
        }

        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_LAYOUT.iter().copied()) {
                return Err(format!(
                    "feature_names {:?} do not match layout {:?}",
                    names, FEATURE_LAYOUT
                ));
            }
        }

        match &self.model {
            Model::Logistic(m) => {
                if m.weights.len() != FEATURE_COUNT {
                    return Err(format!(
                        "logistic model has {} weights, expected {}",
                        m.weights.len(),
                        FEATURE_COUNT
                    ));
                }
                if m.weights.iter().chain([&m.intercept]).any(|v| !v.is_finite()) {
                    return Err("logistic model has non-finite coefficients".to_string());
                }
            }
            Model::DecisionTree(tree) => tree.check(0)?,
            Model::RandomForest(forest) => {
                if forest.trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (i, tree) in forest.trees.iter().enumerate() {
                    tree.check(i)?;
                }
            }
        }
        Ok(())
    }
}

impl FraudClassifier for ModelArtifact {
    fn predict(&self, features: &FeatureVector) -> FraudLabel {
        let x = features.as_array();
        match &self.model {
            Model::Logistic(m) => {
                if m.decision_function(x) > 0.0 {
                    FraudLabel::Fraud
                } else {
                    FraudLabel::NoFraud
                }
            }
            Model::DecisionTree(tree) => argmax(tree.probabilities(x)),
            Model::RandomForest(forest) => {
                let mut sum = [0.0; 2];
                for tree in &forest.trees {
                    let p = tree.probabilities(x);
                    sum[0] += p[0];
                    sum[1] += p[1];
                }
                argmax(sum)
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self.model {
            Model::Logistic(_) => "logistic",
            Model::DecisionTree(_) => "decision_tree",
            Model::RandomForest(_) => "random_forest",
        }
    }
}

// ============================================================================
// LOADER
// ============================================================================

/// Loaded model with provenance
pub struct LoadedModel {
    pub path: PathBuf,
    pub sha256: String,
    pub artifact: ModelArtifact,
}

/// Load and validate a model artifact from disk
pub fn load_model(path: &Path) -> Result<LoadedModel, StartupError> {
    tracing::info!(path = %path.display(), "Loading model artifact");

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StartupError::ModelNotFound(path.to_path_buf()),
        _ => StartupError::ModelUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;

    let sha256 = hex::encode(Sha256::digest(&bytes));

    let artifact = ModelArtifact::from_json(&bytes).map_err(|reason| StartupError::ModelCorrupt {
        path: path.to_path_buf(),
        reason,
    })?;

    tracing::info!(
        path = %path.display(),
        kind = artifact.kind(),
        sha256 = %sha256,
        "Model loaded successfully"
    );

    Ok(LoadedModel {
        path: path.to_path_buf(),
        sha256,
        artifact,
    })
}
