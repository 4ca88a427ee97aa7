//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::QueryContext;
use crate::store::HealthStore;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Metrics store over the shared backend
    pub store: Arc<HealthStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<HealthStore>, config: ApiConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Fresh context for one request, bounded by the configured timeout
    ///
    /// If the client disconnects, axum drops the handler future and with it
    /// any backend call in flight.
    pub fn request_context(&self) -> QueryContext {
        QueryContext::with_timeout(Duration::from_millis(self.config.request_timeout_ms))
    }

    /// Requested date, or today in the store's zone
    pub fn date_or_today(&self, date: Option<String>) -> String {
        date.filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.store.today_string())
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deadline for the backend work of one request, in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 13001,
            request_timeout_ms: 30_000,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
