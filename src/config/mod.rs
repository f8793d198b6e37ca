use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the pipeline and the dashboard service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pipeline: PipelineConfig,
    pub geocoder: GeocoderConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            input_pdf: env_path("HOUSING_INPUT_PDF", defaults.input_pdf),
            dataset_path: env_path("HOUSING_DATASET_PATH", defaults.dataset_path),
            listing_year: env_number("HOUSING_LISTING_YEAR", defaults.listing_year)?,
            property_manager: env::var("HOUSING_PROPERTY_MANAGER")
                .unwrap_or(defaults.property_manager),
            source_url: env::var("HOUSING_SOURCE_URL")
                .ok()
                .or(defaults.source_url)
                .filter(|url| !url.trim().is_empty()),
        };

        let defaults = GeocoderConfig::default();
        let geocoder = GeocoderConfig {
            base_url: env::var("GEOCODER_URL").unwrap_or(defaults.base_url),
            user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent),
            locality: env::var("GEOCODER_LOCALITY").unwrap_or(defaults.locality),
            timeout_secs: env_number("GEOCODER_TIMEOUT_SECS", defaults.timeout_secs)?,
            min_interval_ms: env_number("GEOCODER_MIN_INTERVAL_MS", defaults.min_interval_ms)?,
            max_retries: env_number("GEOCODER_MAX_RETRIES", defaults.max_retries)?,
            retry_backoff_ms: env_number("GEOCODER_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pipeline,
            geocoder,
        })
    }
}

fn env_path(var: &'static str, default: PathBuf) -> PathBuf {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

fn env_number<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        _ => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// File locations and document-level facts for a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input_pdf: PathBuf,
    pub dataset_path: PathBuf,
    /// Year applied to `M/D` availability annotations, which omit it.
    pub listing_year: i32,
    pub property_manager: String,
    pub source_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_pdf: PathBuf::from("data/raw/kamap_availability.pdf"),
            dataset_path: PathBuf::from("data/geocoded/all_listings_geocoded.csv"),
            listing_year: 2026,
            property_manager: "Kamap Property Management".to_string(),
            source_url: Some("https://www.kamap.net/".to_string()),
        }
    }
}

/// Geocoding provider endpoint and politeness settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Appended to every query so bare street addresses resolve in Isla Vista.
    pub locality: String,
    pub timeout_secs: u64,
    pub min_interval_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "iv-housing/0.1 (housing listings pipeline)".to_string(),
            locality: "Isla Vista, CA 93117".to_string(),
            timeout_secs: 10,
            min_interval_ms: 1000,
            max_retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a number, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "HOUSING_INPUT_PDF",
            "HOUSING_DATASET_PATH",
            "HOUSING_LISTING_YEAR",
            "HOUSING_PROPERTY_MANAGER",
            "HOUSING_SOURCE_URL",
            "GEOCODER_URL",
            "GEOCODER_USER_AGENT",
            "GEOCODER_LOCALITY",
            "GEOCODER_TIMEOUT_SECS",
            "GEOCODER_MIN_INTERVAL_MS",
            "GEOCODER_MAX_RETRIES",
            "GEOCODER_RETRY_BACKOFF_MS",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.geocoder, GeocoderConfig::default());
        assert_eq!(config.geocoder.max_retries, 1);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn pipeline_paths_and_geocoder_settings_follow_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HOUSING_INPUT_PDF", "/tmp/listings.pdf");
        env::set_var("HOUSING_LISTING_YEAR", "2027");
        env::set_var("GEOCODER_MAX_RETRIES", "0");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.pipeline.input_pdf, PathBuf::from("/tmp/listings.pdf"));
        assert_eq!(config.pipeline.listing_year, 2027);
        assert_eq!(config.geocoder.max_retries, 0);
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_geocoder_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GEOCODER_TIMEOUT_SECS", "soon");
        let error = AppConfig::load().expect_err("timeout must be numeric");
        match error {
            ConfigError::InvalidNumber { var, value } => {
                assert_eq!(var, "GEOCODER_TIMEOUT_SECS");
                assert_eq!(value, "soon");
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
        reset_env();
    }
}
