//! Detection logic: encoding, feature assembly, classification

pub mod classifier;
pub mod controller;
pub mod encoder;
pub mod features;

pub use classifier::{FraudClassifier, FraudLabel};
pub use controller::{FormController, SubmissionOutcome, SubmitError};
pub use features::FeatureVector;
