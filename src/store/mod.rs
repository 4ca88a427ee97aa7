//! Health metrics store
//!
//! Turns raw points in the time-series backend into the dashboard's views.
//! Each view resolves its date parameter into a UTC window, runs one or more
//! queries through the `QueryExecutor` and shapes the rows into records.
//!
//! # Views
//!
//! | operation            | window                         | measurements                      |
//! |----------------------|--------------------------------|-----------------------------------|
//! | `summary`            | local day                      | daily_totals, dietary_energy      |
//! | `heart_rate`         | rolling 24h ending now         | heart_rate                        |
//! | `blood_pressure`     | 30 days ending at end date     | blood_pressure                    |
//! | `glucose`            | 30 days                        | blood_glucose                     |
//! | `sleep`              | 7 days                         | sleep_analysis                    |
//! | `workouts`           | 90 days                        | workout, workout_heart_rate       |
//! | `dietary_trends`     | 30 days (+7 priming)           | dietary_energy, protein, ...      |
//! | `body_composition`   | 30 days                        | weight_body_mass, body_fat_percentage |
//!
//! The store holds no state of its own between calls. The backend handle is
//! shared by every caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use vitalstream::backend::{MemoryBackend, QueryContext};
//! use vitalstream::store::HealthStore;
//! use vitalstream::time::ZoneResolver;
//! use std::sync::Arc;
//!
//! let store = HealthStore::new(Arc::new(MemoryBackend::new()), ZoneResolver::default());
//! let summary = store.summary("2024-05-01", &QueryContext::new()).await?;
//! println!("{} steps", summary.steps);
//! ```

mod body;
mod classify;
mod dietary;
mod error;
mod executor;
mod ingest;
mod sleep;
mod summary;
mod types;
mod vitals;
mod workouts;

pub use classify::{classify_bp, BpCategory};
pub use dietary::{build_trends, rolling_calorie_trend, DailyNutrients, Nutrient};
pub use error::{StoreError, StoreResult};
pub use executor::QueryExecutor;
pub use summary::DailyMetric;
pub use types::{
    BloodPressure, BodyComposition, DietaryTrend, Glucose, Meal, Sleep, Summary, TimeSeriesValue,
    Workout,
};

use chrono::NaiveDate;
use std::sync::Arc;

use crate::backend::TimeSeriesBackend;
use crate::time::{Clock, SystemClock, ZoneResolver, DATE_FORMAT};

/// Default data source whose device totals feed the summary
pub const DEFAULT_WEARABLE_SOURCE: &str = "RingConn";

/// Tunables for the view builders
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// `source` tag value trusted for steps and energy totals
    pub wearable_source: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            wearable_source: DEFAULT_WEARABLE_SOURCE.to_string(),
        }
    }
}

/// The metrics store
#[derive(Clone)]
pub struct HealthStore {
    executor: QueryExecutor,
    zone: ZoneResolver,
    clock: Arc<dyn Clock>,
    settings: StoreSettings,
}

impl HealthStore {
    /// Create a store over `backend`, resolving dates in `zone`
    pub fn new(backend: Arc<dyn TimeSeriesBackend>, zone: ZoneResolver) -> Self {
        Self {
            executor: QueryExecutor::new(backend),
            zone,
            clock: Arc::new(SystemClock),
            settings: StoreSettings::default(),
        }
    }

    /// Builder method: replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder method: replace the settings
    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn zone(&self) -> &ZoneResolver {
        &self.zone
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn backend(&self) -> &Arc<dyn TimeSeriesBackend> {
        self.executor.backend()
    }

    /// Today's date in the store's zone
    pub fn today(&self) -> NaiveDate {
        self.zone.today(self.clock.now())
    }

    /// Today's date as `YYYY-MM-DD`, the default for absent date parameters
    pub fn today_string(&self) -> String {
        self.today().format(DATE_FORMAT).to_string()
    }

    /// Check that the backend is reachable
    pub async fn health_check(&self) -> StoreResult<()> {
        self.backend()
            .health_check()
            .await
            .map_err(|e| StoreError::from_backend("health", e))
    }

    /// Release the backend
    pub async fn close(&self) {
        tracing::info!(backend = self.backend().name(), "Closing backend");
        self.backend().close().await;
    }
}
