//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ApiConfig as ServerConfig;
use crate::backend::InfluxConfig;
use crate::store::{StoreSettings, DEFAULT_WEARABLE_SOURCE};
use crate::time::ZoneResolver;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub influx: InfluxSection,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which time-series backend the server talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Influx,
    /// In-process store, lost on exit
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "influx" | "influxdb" => Ok(Self::Influx),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown backend '{}' (expected influx or memory)", other)),
        }
    }
}

/// InfluxDB connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct InfluxSection {
    #[serde(default = "default_influx_host")]
    pub host: String,

    pub token: Option<String>,

    #[serde(default = "default_influx_org")]
    pub org: String,

    #[serde(default = "default_influx_database")]
    pub database: String,

    #[serde(default = "default_influx_timeout")]
    pub request_timeout_secs: u64,
}

fn default_influx_host() -> String {
    "http://localhost:8181".to_string()
}

fn default_influx_org() -> String {
    "vitalstream".to_string()
}

fn default_influx_database() -> String {
    "health".to_string()
}

fn default_influx_timeout() -> u64 {
    30
}

impl Default for InfluxSection {
    fn default() -> Self {
        Self {
            host: default_influx_host(),
            token: None,
            org: default_influx_org(),
            database: default_influx_database(),
            request_timeout_secs: default_influx_timeout(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    13001
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// View settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// IANA zone that calendar dates are resolved in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_wearable_source")]
    pub wearable_source: String,
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_wearable_source() -> String {
    DEFAULT_WEARABLE_SOURCE.to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            wearable_source: default_wearable_source(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Runs before logging is configured, so nothing is logged here; call
    /// [`LoadedConfig::log`] once a subscriber is installed.
    pub fn load_default() -> LoadedConfig {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("vitalstream").join("config.toml")),
            Some(PathBuf::from("/etc/vitalstream/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths, |key| std::env::var(key).ok())
    }

    /// First readable file in `paths` with overrides applied, else defaults
    fn load_first(paths: &[PathBuf], lookup: impl Fn(&str) -> Option<String>) -> LoadedConfig {
        let mut warnings = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load(path) {
                Ok(mut config) => {
                    warnings.extend(config.apply_overrides(&lookup));
                    return LoadedConfig {
                        config,
                        source: Some(path.clone()),
                        warnings,
                    };
                }
                Err(e) => warnings.push(format!("Failed to load config from {:?}: {}", path, e)),
            }
        }

        let mut config = Config::default();
        warnings.extend(config.apply_overrides(&lookup));
        LoadedConfig {
            config,
            source: None,
            warnings,
        }
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        for warning in self.apply_overrides(|key| std::env::var(key).ok()) {
            tracing::warn!("{}", warning);
        }
    }

    /// Apply overrides from any key lookup
    ///
    /// Unparseable values are ignored and described in the returned warnings.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(kind) = lookup("VITALSTREAM_BACKEND") {
            match kind.parse() {
                Ok(kind) => self.backend = kind,
                Err(e) => warnings.push(format!("Ignoring VITALSTREAM_BACKEND: {}", e)),
            }
        }

        // Influx overrides
        if let Some(host) = lookup("INFLUX_HOST") {
            self.influx.host = host;
        }
        if let Some(token) = lookup("INFLUX_TOKEN") {
            self.influx.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(org) = lookup("INFLUX_ORG") {
            self.influx.org = org;
        }
        if let Some(database) = lookup("INFLUX_DATABASE") {
            self.influx.database = database;
        }

        // API overrides
        if let Some(host) = lookup("VITALSTREAM_API_HOST") {
            self.api.host = host;
        }
        let port = lookup("VITALSTREAM_API_PORT").or_else(|| lookup("PORT"));
        if let Some(port) = port {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => warnings.push(format!("Ignoring API port '{}': not a port number", port)),
            }
        }

        if let Some(timezone) = lookup("VITALSTREAM_TIMEZONE") {
            self.store.timezone = timezone;
        }

        // Logging overrides
        if let Some(level) = lookup("VITALSTREAM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("VITALSTREAM_LOG_FORMAT") {
            self.logging.format = format;
        }

        warnings
    }

    /// Connection settings for `InfluxBackend`
    pub fn influx_config(&self) -> InfluxConfig {
        InfluxConfig {
            host: self.influx.host.clone(),
            token: self.influx.token.clone(),
            org: self.influx.org.clone(),
            database: self.influx.database.clone(),
            request_timeout_ms: self.influx.request_timeout_secs * 1000,
        }
    }

    /// Settings for the HTTP server
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.api.host.clone(),
            port: self.api.port,
            request_timeout_ms: self.api.request_timeout_secs * 1000,
            max_body_size: self.api.max_body_size,
        }
    }

    /// The configured zone
    pub fn zone(&self) -> Result<ZoneResolver, ConfigError> {
        ZoneResolver::from_name(&self.store.timezone).map_err(|error| ConfigError::Timezone {
            name: self.store.timezone.clone(),
            error,
        })
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            wearable_source: self.store.wearable_source.clone(),
        }
    }
}

/// A config together with where it came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the config was read from; `None` means defaults plus environment
    pub source: Option<PathBuf>,
    /// Files that failed to load and override values that were ignored
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Report the config source and any warnings
    pub fn log(&self) {
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Unknown timezone '{name}': {error}")]
    Timezone { name: String, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Vitalstream Configuration
#
# Environment variables override these settings:
# - VITALSTREAM_BACKEND
# - INFLUX_HOST, INFLUX_TOKEN, INFLUX_ORG, INFLUX_DATABASE
# - VITALSTREAM_API_HOST
# - VITALSTREAM_API_PORT (or PORT)
# - VITALSTREAM_TIMEZONE
# - VITALSTREAM_LOG_LEVEL
# - VITALSTREAM_LOG_FORMAT

# Time-series backend: influx or memory (in-process, not persisted)
backend = "influx"

[influx]
# InfluxDB 3 base URL
host = "http://localhost:8181"

# API token (leave unset for an unauthenticated local instance)
# token = ""

org = "vitalstream"

# Database holding the health measurements
database = "health"

# Per-request transport timeout in seconds
request_timeout_secs = 30

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 13001

# Deadline for the backend work of one request, in seconds
request_timeout_secs = 30

# Maximum request body size in bytes
max_body_size = 10485760

[store]
# Zone that calendar dates are resolved in
timezone = "America/New_York"

# Source tag trusted for daily step and energy totals
wearable_source = "RingConn"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_generated_config_round_trips_to_defaults() {
        let file = write_config(&generate_default_config());
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.backend, BackendKind::Influx);
        assert_eq!(config.influx.host, "http://localhost:8181");
        assert!(config.influx.token.is_none());
        assert_eq!(config.api.port, 13001);
        assert_eq!(config.api.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.store.timezone, "America/New_York");
        assert_eq!(config.store.wearable_source, "RingConn");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
backend = "memory"

[store]
timezone = "Europe/Berlin"
"#,
        );
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.store.timezone, "Europe/Berlin");
        assert_eq!(config.store.wearable_source, "RingConn");
        assert_eq!(config.api.port, 13001);
        assert_eq!(config.influx.database, "health");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load(Path::new("/nonexistent/vitalstream.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let file = write_config("[api]\nport = \"not a number\"\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("VITALSTREAM_BACKEND", "memory"),
            ("INFLUX_HOST", "http://influx:8181"),
            ("INFLUX_TOKEN", "secret"),
            ("PORT", "9000"),
            ("VITALSTREAM_TIMEZONE", "America/Los_Angeles"),
            ("VITALSTREAM_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.influx.host, "http://influx:8181");
        assert_eq!(config.influx.token.as_deref(), Some("secret"));
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.store.timezone, "America/Los_Angeles");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_api_port_wins_over_port() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "VITALSTREAM_API_PORT" => Some("8080".to_string()),
            "PORT" => Some("9000".to_string()),
            _ => None,
        });
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn test_bad_override_values_are_ignored() {
        let mut config = Config::default();
        let warnings = config.apply_overrides(|key| match key {
            "VITALSTREAM_BACKEND" => Some("postgres".to_string()),
            "VITALSTREAM_API_PORT" => Some("eighty".to_string()),
            _ => None,
        });
        assert_eq!(config.backend, BackendKind::Influx);
        assert_eq!(config.api.port, 13001);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_load_first_skips_unreadable_files_and_keeps_warnings() {
        let broken = write_config("[api]\nport = \"not a number\"\n");
        let good = write_config("[api]\nport = 9000\n");
        let missing = PathBuf::from("/nonexistent/vitalstream/config.toml");

        let loaded = Config::load_first(
            &[
                missing,
                broken.path().to_path_buf(),
                good.path().to_path_buf(),
            ],
            |key| (key == "VITALSTREAM_BACKEND").then(|| "sqlite".to_string()),
        );

        assert_eq!(loaded.source.as_deref(), Some(good.path()));
        assert_eq!(loaded.config.api.port, 9000);
        assert_eq!(loaded.warnings.len(), 2);
        assert!(loaded.warnings[0].contains("Failed to load config"));
        assert!(loaded.warnings[1].contains("VITALSTREAM_BACKEND"));
    }

    #[test]
    fn test_load_first_falls_back_to_defaults() {
        let loaded = Config::load_first(&[], |key| {
            (key == "VITALSTREAM_BACKEND").then(|| "memory".to_string())
        });

        assert!(loaded.source.is_none());
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.config.backend, BackendKind::Memory);
    }

    #[test]
    fn test_derived_settings() {
        let config = Config::default();

        assert_eq!(config.influx_config().request_timeout_ms, 30_000);
        assert_eq!(config.server_config().addr(), "0.0.0.0:13001");
        assert_eq!(config.zone().unwrap().tz(), chrono_tz::America::New_York);
        assert_eq!(config.store_settings().wearable_source, "RingConn");
    }

    #[test]
    fn test_unknown_timezone() {
        let mut config = Config::default();
        config.store.timezone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(config.zone(), Err(ConfigError::Timezone { .. })));
    }
}
