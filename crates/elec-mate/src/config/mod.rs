use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::elec_id::StatusThresholds;
use crate::workflows::evidence::Percent;

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub analysis: AnalysisConfig,
    pub evidence: EvidenceConfig,
    pub credentials: StatusThresholds,
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
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let endpoint = env::var("APP_ANALYSIS_ENDPOINT")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let timeout_secs = parse_or_default(
            "APP_ANALYSIS_TIMEOUT_SECS",
            DEFAULT_ANALYSIS_TIMEOUT_SECS,
            ConfigError::InvalidAnalysisTimeout,
        )?;

        let public_base_url = env::var("APP_STORAGE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}/files"));
        let max_upload_bytes = parse_or_default(
            "APP_MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
            ConfigError::InvalidUploadLimit,
        )?;
        let auto_select_confidence = parse_or_default(
            "APP_AUTO_SELECT_CONFIDENCE",
            Percent::AUTO_SELECT_DEFAULT.value(),
            ConfigError::InvalidConfidence,
        )
        .and_then(|value| Percent::new(value).map_err(|_| ConfigError::InvalidConfidence))?;

        let defaults = StatusThresholds::default();
        let credentials = StatusThresholds {
            cert_warning_days: parse_or_default(
                "APP_CERT_WARNING_DAYS",
                defaults.cert_warning_days,
                ConfigError::InvalidThreshold("APP_CERT_WARNING_DAYS"),
            )?,
            ecs_expiring_days: parse_or_default(
                "APP_ECS_EXPIRING_DAYS",
                defaults.ecs_expiring_days,
                ConfigError::InvalidThreshold("APP_ECS_EXPIRING_DAYS"),
            )?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            analysis: AnalysisConfig {
                endpoint,
                timeout: Duration::from_secs(timeout_secs),
            },
            evidence: EvidenceConfig {
                public_base_url,
                max_upload_bytes,
                auto_select_confidence,
            },
            credentials,
        })
    }
}

fn parse_or_default<T: std::str::FromStr>(
    key: &str,
    default: T,
    error: ConfigError,
) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| error),
        Err(_) => Ok(default),
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
    pub log_format: LogFormat,
}

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Remote AI evidence analysis endpoint.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

/// Upload limits and the public URL prefix for stored evidence.
#[derive(Debug, Clone)]
pub struct EvidenceConfig {
    pub public_base_url: String,
    pub max_upload_bytes: u64,
    pub auto_select_confidence: Percent,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://127.0.0.1:3000/files".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            auto_select_confidence: Percent::AUTO_SELECT_DEFAULT,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAnalysisTimeout,
    InvalidUploadLimit,
    InvalidConfidence,
    InvalidThreshold(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAnalysisTimeout => {
                write!(f, "APP_ANALYSIS_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidUploadLimit => {
                write!(f, "APP_MAX_UPLOAD_BYTES must be a valid byte count")
            }
            ConfigError::InvalidConfidence => {
                write!(f, "APP_AUTO_SELECT_CONFIDENCE must be between 0 and 100")
            }
            ConfigError::InvalidThreshold(key) => write!(f, "{key} must be a number of days"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
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
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "APP_ANALYSIS_ENDPOINT",
            "APP_ANALYSIS_TIMEOUT_SECS",
            "APP_STORAGE_PUBLIC_URL",
            "APP_MAX_UPLOAD_BYTES",
            "APP_AUTO_SELECT_CONFIDENCE",
            "APP_CERT_WARNING_DAYS",
            "APP_ECS_EXPIRING_DAYS",
        ] {
            env::remove_var(key);
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
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert!(config.analysis.endpoint.is_none());
        assert_eq!(config.analysis.timeout, Duration::from_secs(30));
        assert_eq!(config.evidence.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.evidence.auto_select_confidence.value(), 80.0);
        assert_eq!(config.evidence.public_base_url, "http://127.0.0.1:3000/files");
        assert_eq!(config.credentials.cert_warning_days, 30);
        assert_eq!(config.credentials.ecs_expiring_days, 60);
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
    fn rejects_out_of_range_confidence() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_AUTO_SELECT_CONFIDENCE", "140");
        let err = AppConfig::load().expect_err("confidence above 100 rejected");
        assert!(matches!(err, ConfigError::InvalidConfidence));

        env::set_var("APP_AUTO_SELECT_CONFIDENCE", "NaN");
        let err = AppConfig::load().expect_err("non-finite confidence rejected");
        assert!(matches!(err, ConfigError::InvalidConfidence));
        reset_env();
    }

    #[test]
    fn keeps_fractional_confidence_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_AUTO_SELECT_CONFIDENCE", "72.5");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.evidence.auto_select_confidence.value(), 72.5);
        reset_env();
    }

    #[test]
    fn blank_analysis_endpoint_is_treated_as_unset() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ANALYSIS_ENDPOINT", "   ");
        env::set_var("APP_ECS_EXPIRING_DAYS", "90");
        let config = AppConfig::load().expect("config loads");
        assert!(config.analysis.endpoint.is_none());
        assert_eq!(config.credentials.ecs_expiring_days, 90);
        reset_env();
    }
}
