//! View Routes
//!
//! One GET per dashboard view. Each handler resolves the date parameter
//! (today in the configured zone when absent), calls the store and returns
//! its records as JSON.
//!
//! - GET /api/v1/summary?date=
//! - GET /api/v1/vitals/hr?date=
//! - GET /api/v1/vitals/bp?end_date=
//! - GET /api/v1/vitals/glucose?end_date=
//! - GET /api/v1/sleep?end_date=
//! - GET /api/v1/workouts?date=
//! - GET /api/v1/dietary/trends?end_date=
//! - GET /api/v1/dietary/meals/today?date=
//! - GET /api/v1/body/composition?end_date=

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DateQuery, EndDateQuery};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::store::{
    BloodPressure, BodyComposition, DietaryTrend, Glucose, Meal, Sleep, Summary, TimeSeriesValue,
    Workout,
};

/// GET /api/v1/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateQuery>,
) -> ApiResult<Json<Summary>> {
    let date = state.date_or_today(params.date);
    tracing::info!(date = %date, "Computing summary");
    let summary = state.store.summary(&date, &state.request_context()).await?;
    Ok(Json(summary))
}

/// GET /api/v1/vitals/hr
pub async fn heart_rate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateQuery>,
) -> ApiResult<Json<Vec<TimeSeriesValue>>> {
    let date = state.date_or_today(params.date);
    let series = state.store.heart_rate(&date, &state.request_context()).await?;
    Ok(Json(series))
}

/// GET /api/v1/vitals/bp
pub async fn blood_pressure(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EndDateQuery>,
) -> ApiResult<Json<Vec<BloodPressure>>> {
    let end_date = state.date_or_today(params.end_date);
    let readings = state
        .store
        .blood_pressure(&end_date, &state.request_context())
        .await?;
    Ok(Json(readings))
}

/// GET /api/v1/vitals/glucose
pub async fn glucose(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EndDateQuery>,
) -> ApiResult<Json<Vec<Glucose>>> {
    let end_date = state.date_or_today(params.end_date);
    let values = state.store.glucose(&end_date, &state.request_context()).await?;
    Ok(Json(values))
}

/// GET /api/v1/sleep
pub async fn sleep(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EndDateQuery>,
) -> ApiResult<Json<Vec<Sleep>>> {
    let end_date = state.date_or_today(params.end_date);
    let nights = state.store.sleep(&end_date, &state.request_context()).await?;
    Ok(Json(nights))
}

/// GET /api/v1/workouts
pub async fn workouts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateQuery>,
) -> ApiResult<Json<Vec<Workout>>> {
    let date = state.date_or_today(params.date);
    let workouts = state.store.workouts(&date, &state.request_context()).await?;
    Ok(Json(workouts))
}

/// GET /api/v1/dietary/trends
pub async fn dietary_trends(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EndDateQuery>,
) -> ApiResult<Json<Vec<DietaryTrend>>> {
    let end_date = state.date_or_today(params.end_date);
    let trends = state
        .store
        .dietary_trends(&end_date, &state.request_context())
        .await?;
    Ok(Json(trends))
}

/// GET /api/v1/dietary/meals/today
pub async fn meals_today(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateQuery>,
) -> ApiResult<Json<Vec<Meal>>> {
    let date = state.date_or_today(params.date);
    let meals = state.store.meals_today(&date).await?;
    Ok(Json(meals))
}

/// GET /api/v1/body/composition
pub async fn body_composition(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EndDateQuery>,
) -> ApiResult<Json<Vec<BodyComposition>>> {
    let end_date = state.date_or_today(params.end_date);
    let records = state
        .store
        .body_composition(&end_date, &state.request_context())
        .await?;
    Ok(Json(records))
}
