//! # Vitalstream
//!
//! Personal health telemetry: ingest points from wearables and apps into a
//! time-series backend and serve pre-shaped dashboard views over them.
//!
//! ## Features
//!
//! - **Calendar-correct windows**: dates resolve from local midnight in one
//!   configured zone, including around DST changes
//! - **Pluggable backend**: InfluxDB 3 over HTTP, or in-process memory
//! - **Streaming reads**: rows are decoded lazily from the backend response
//! - **Cancellation**: every query honors a caller deadline and cancel token
//!
//! ## Modules
//!
//! - [`time`]: windows, zone resolution and the injectable clock
//! - [`backend`]: time-series backend trait, codecs and implementations
//! - [`store`]: view builders, classification and ingest
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitalstream::backend::{MemoryBackend, Metric, QueryContext};
//! use vitalstream::store::HealthStore;
//! use vitalstream::time::ZoneResolver;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = HealthStore::new(Arc::new(MemoryBackend::new()), ZoneResolver::default());
//!     let ctx = QueryContext::new();
//!
//!     store
//!         .ingest(
//!             &[Metric::new("blood_pressure")
//!                 .field("systolic", 128i64)
//!                 .field("diastolic", 82i64)],
//!             &ctx,
//!         )
//!         .await?;
//!
//!     let readings = store.blood_pressure(&store.today_string(), &ctx).await?;
//!     println!("{} readings, latest {}", readings.len(), readings[0].category);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod store;
pub mod time;

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use backend::{
    BackendError, FieldValue, InfluxBackend, InfluxConfig, MemoryBackend, Metric, QueryContext,
    TimeSeriesBackend,
};

pub use store::{classify_bp, BpCategory, HealthStore, StoreError, StoreResult};

pub use time::{Clock, SystemClock, TimeWindow, ZoneResolver};

pub use config::{Config, ConfigError, LoadedConfig, LoggingConfig};
