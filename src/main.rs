//! Vitalstream API Server
//!
//! Run with: cargo run --bin vitalstream
//!
//! Configuration is read from `config.toml` (see `vitalstream-cli config`)
//! with environment overrides; `RUST_LOG` takes precedence over the
//! configured log level.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vitalstream::api::{serve, AppState};
use vitalstream::backend::{InfluxBackend, MemoryBackend, TimeSeriesBackend};
use vitalstream::config::{BackendKind, Config, LoggingConfig};
use vitalstream::store::HealthStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loaded = Config::load_default();
    init_tracing(&loaded.config.logging);

    tracing::info!("Starting Vitalstream API server v{}", env!("CARGO_PKG_VERSION"));
    loaded.log();
    let config = loaded.config;

    let zone = config.zone()?;
    tracing::info!("Resolving dates in {}", zone.tz().name());

    let backend: Arc<dyn TimeSeriesBackend> = match config.backend {
        BackendKind::Influx => {
            let influx = config.influx_config();
            tracing::info!(host = %influx.host, database = %influx.database, "Using InfluxDB backend");
            Arc::new(InfluxBackend::new(influx)?)
        }
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; data is lost on exit");
            Arc::new(MemoryBackend::new())
        }
    };

    let store = Arc::new(HealthStore::new(backend, zone).with_settings(config.store_settings()));

    match store.health_check().await {
        Ok(()) => tracing::info!("Backend connection verified"),
        Err(e) => tracing::warn!("Backend not reachable: {} (views will fail until it is)", e),
    }

    let server_config = config.server_config();
    let state = AppState::new(Arc::clone(&store), server_config.clone());
    let result = serve(state, &server_config).await;

    tracing::info!("Closing backend...");
    store.close().await;

    result?;
    tracing::info!("Vitalstream API server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "vitalstream={},tower_http=info",
            logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
