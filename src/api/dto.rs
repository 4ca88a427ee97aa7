//! Data Transfer Objects
//!
//! Request and response types for the API endpoints. View responses are the
//! store's records serialized as-is.

use serde::{Deserialize, Serialize};

use crate::backend::Metric;

// ============================================
// INGEST DTOs
// ============================================

/// Batch ingest request
#[derive(Debug, Deserialize, Serialize)]
pub struct IngestRequest {
    pub metrics: Vec<Metric>,
}

/// Batch ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Status: "accepted"
    pub status: String,
    /// Number of points written
    pub accepted: usize,
}

// ============================================
// VIEW QUERY PARAMETERS
// ============================================

/// `?date=YYYY-MM-DD`; today when absent
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// `?end_date=YYYY-MM-DD`; today when absent
#[derive(Debug, Default, Deserialize)]
pub struct EndDateQuery {
    pub end_date: Option<String>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// Backend name, e.g. "influxdb"
    pub backend: String,
    /// "ok" or the backend's error
    pub backend_status: String,
    pub timezone: String,
    pub uptime_seconds: u64,
    pub version: String,
}
