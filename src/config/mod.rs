use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::inspection::catalog::{RoomRangeParseError, RoomRanges};
use crate::workflows::inspection::scoring::ScoringConfig;
use crate::workflows::inspection::service::InspectionSettings;

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
    pub inspection: InspectionSettings,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            inspection: load_inspection_settings()?,
        })
    }
}

fn load_inspection_settings() -> Result<InspectionSettings, ConfigError> {
    let rooms = match env::var("INSPECTION_ROOM_RANGES") {
        Ok(raw) => raw
            .parse::<RoomRanges>()
            .map_err(|source| ConfigError::InvalidRoomRanges { source })?,
        Err(_) => RoomRanges::standard(),
    };

    let defaults = ScoringConfig::default();
    let scoring = ScoringConfig {
        regular_point_value: points_var("INSPECTION_REGULAR_POINTS", defaults.regular_point_value)?,
        auto_failure_point_value: points_var(
            "INSPECTION_AUTO_FAILURE_POINTS",
            defaults.auto_failure_point_value,
        )?,
        outstanding_max: defaults.outstanding_max,
        passed_max: points_var("INSPECTION_PASSED_MAX", defaults.passed_max)?,
    };

    if scoring.passed_max < scoring.outstanding_max {
        return Err(ConfigError::InvalidScoring {
            variable: "INSPECTION_PASSED_MAX",
        });
    }

    Ok(InspectionSettings {
        scoring,
        rooms,
        ..InspectionSettings::default()
    })
}

fn points_var(variable: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidScoring { variable }),
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
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRoomRanges { source: RoomRangeParseError },
    InvalidScoring { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRoomRanges { source } => {
                write!(f, "INSPECTION_ROOM_RANGES is invalid: {source}")
            }
            ConfigError::InvalidScoring { variable } => {
                write!(f, "{variable} must be a non-negative integer within the scoring thresholds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidScoring { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidRoomRanges { source } => Some(source),
        }
    }
}
