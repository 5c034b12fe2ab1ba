use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
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

/// Top-level configuration for the portal service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portal: PortalConfig,
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

        let allow_role_switching = match env::var("APP_ALLOW_ROLE_SWITCHING") {
            Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag {
                name: "APP_ALLOW_ROLE_SWITCHING",
                value,
            })?,
            Err(_) => false,
        };
        if allow_role_switching && environment == AppEnvironment::Production {
            return Err(ConfigError::RoleSwitchingInProduction);
        }

        let simulated_latency_ms = env::var("APP_SIMULATED_LATENCY_MS")
            .unwrap_or_else(|_| "0".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidLatency)?;

        let bid_catalogue = env::var("APP_BID_CATALOGUE")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portal: PortalConfig {
                allow_role_switching,
                simulated_latency_ms,
                bid_catalogue,
            },
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
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

/// Portal behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalConfig {
    /// Demo-only role switcher. Never enabled in production.
    pub allow_role_switching: bool,
    /// Delay applied to every portal API call, emulating a remote backend.
    pub simulated_latency_ms: u64,
    /// Optional CSV catalogue used to seed bids at startup.
    pub bid_catalogue: Option<PathBuf>,
}

impl PortalConfig {
    pub fn simulated_latency(&self) -> Option<Duration> {
        (self.simulated_latency_ms > 0).then(|| Duration::from_millis(self.simulated_latency_ms))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str, value: String },
    InvalidLatency,
    RoleSwitchingInProduction,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be true or false, got '{}'", name, value)
            }
            ConfigError::InvalidLatency => {
                write!(f, "APP_SIMULATED_LATENCY_MS must be a whole number of milliseconds")
            }
            ConfigError::RoleSwitchingInProduction => {
                write!(f, "APP_ALLOW_ROLE_SWITCHING cannot be enabled in production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidLatency
            | ConfigError::RoleSwitchingInProduction => None,
        }
    }
}
