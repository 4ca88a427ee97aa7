//! Ingest Routes
//!
//! - POST /api/v1/ingest - Batch of metrics, written in one backend call

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{IngestRequest, IngestResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// Maximum number of metrics accepted per request
pub const MAX_BATCH: usize = 10_000;

/// POST /api/v1/ingest
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    if req.metrics.len() > MAX_BATCH {
        return Err(crate::api::ApiError::Validation(format!(
            "Batch size exceeds maximum of {} metrics",
            MAX_BATCH
        )));
    }

    let ctx = state.request_context();
    let accepted = state.store.ingest(&req.metrics, &ctx).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            status: "accepted".to_string(),
            accepted,
        }),
    ))
}
