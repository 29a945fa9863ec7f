//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Reference dataset (CSV) used to fit the category encoders
    pub dataset_path: PathBuf,

    /// Pretrained model artifact (JSON)
    pub model_path: PathBuf,

    /// Cosmetic wait before the classifier is called
    pub predict_delay: Duration,

    /// Fit encoders once at startup instead of on every submission
    pub cache_encoders: bool,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            dataset_path: lookup("DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("Dataset/dataset.csv")),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("model/best.json")),

            predict_delay: Duration::from_millis(
                lookup("PREDICT_DELAY_MS")
                    .and_then(|ms| ms.parse().ok())
                    .unwrap_or(3000),
            ),

            cache_encoders: lookup("CACHE_ENCODERS")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),

            log_format: lookup("LOG_FORMAT")
                .unwrap_or_else(|| "pretty".to_string()),

            environment: lookup("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
