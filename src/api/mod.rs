//! Vitalstream REST API
//!
//! HTTP layer over the `HealthStore`, built with Axum. Handlers decode the
//! request, call the store and encode the result; nothing else.
//!
//! # Endpoints
//!
//! ## Ingest
//! - `POST /api/v1/ingest` - Batch of metrics (`{"metrics": [...]}`), 202 on success
//!
//! ## Views
//! - `GET /api/v1/summary?date=`
//! - `GET /api/v1/vitals/hr?date=`
//! - `GET /api/v1/vitals/bp?end_date=`
//! - `GET /api/v1/vitals/glucose?end_date=`
//! - `GET /api/v1/sleep?end_date=`
//! - `GET /api/v1/workouts?date=`
//! - `GET /api/v1/dietary/trends?end_date=`
//! - `GET /api/v1/dietary/meals/today?date=`
//! - `GET /api/v1/body/composition?end_date=`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe (backend health check)
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use vitalstream::api::{serve, ApiConfig, AppState};
//! use vitalstream::backend::MemoryBackend;
//! use vitalstream::store::HealthStore;
//! use vitalstream::time::ZoneResolver;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = HealthStore::new(Arc::new(MemoryBackend::new()), ZoneResolver::default());
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(Arc::new(store), config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/ingest", post(routes::ingest::ingest))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .route("/summary", get(routes::views::summary))
        .route("/vitals/hr", get(routes::views::heart_rate))
        .route("/vitals/bp", get(routes::views::blood_pressure))
        .route("/vitals/glucose", get(routes::views::glucose))
        .route("/sleep", get(routes::views::sleep))
        .route("/workouts", get(routes::views::workouts))
        .route("/dietary/trends", get(routes::views::dietary_trends))
        .route("/dietary/meals/today", get(routes::views::meals_today))
        .route("/body/composition", get(routes::views::body_composition));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server and run until a shutdown signal arrives
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Vitalstream API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Vitalstream API shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
