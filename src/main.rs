//! FASTag Fraud Detector
//!
//! Single-page form for toll transactions. Categorical fields are label
//! encoded against a reference dataset, the resulting feature vector goes
//! to a pretrained classifier, and the page shows the verdict.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    FASTAG FRAUD DETECTOR                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────────┐   ┌────────────────┐  │
//! │  │ Form / API │──▶│ Form Controller  │──▶│ Fraud          │  │
//! │  │  (Axum)    │   │ validate, encode │   │ Classifier     │  │
//! │  └────────────┘   └────────┬─────────┘   └────────────────┘  │
//! │                            ▼                                 │
//! │                  ┌───────────────────┐                       │
//! │                  │ Reference Dataset │ (CSV, read-only)      │
//! │                  └───────────────────┘                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod logic;
mod models;
mod startup;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;
use std::sync::Arc;

pub use error::{AppError, AppResult};
use logic::FormController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fastag_fraud=debug,tower_http=debug".into());
    if config.log_format == "json" || config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("FASTag Fraud Detector starting...");
    tracing::info!(
        dataset = %config.dataset_path.display(),
        model = %config.model_path.display(),
        delay_ms = config.predict_delay.as_millis() as u64,
        cache_encoders = config.cache_encoders,
        "Configuration loaded"
    );

    // Load dataset and model once; failures disable prediction but keep serving
    let resources = startup::load(&config);
    if resources.is_ready() {
        tracing::info!("Startup resources loaded");
    } else {
        tracing::warn!(
            errors = resources.errors.len(),
            "Prediction disabled until startup errors are fixed"
        );
    }

    let state = AppState {
        controller: Arc::new(FormController::new(Arc::new(resources), config.predict_delay)),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<FormController>,
}

/// Largest accepted request body, form or JSON
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        // Form page
        .route("/", get(handlers::form::show))
        .route("/detect", post(handlers::form::detect))

        // JSON API
        .route("/api/v1/detect", post(handlers::detect::detect))
        .route("/api/v1/vocabulary", get(handlers::vocabulary::list))

        .route("/health", get(handlers::health::check))

        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
