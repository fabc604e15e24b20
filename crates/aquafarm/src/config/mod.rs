use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub farm: FarmConfig,
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
            farm: FarmConfig::from_env()?,
        })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Farm-level operating settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmConfig {
    pub bootstrap_admin: Option<AdminSeed>,
    /// Trailing window used for recent feed and mortality figures.
    pub feed_window_days: u32,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            bootstrap_admin: None,
            feed_window_days: DEFAULT_FEED_WINDOW_DAYS,
        }
    }
}

const DEFAULT_FEED_WINDOW_DAYS: u32 = 7;
const MAX_FEED_WINDOW_DAYS: u32 = 90;

impl FarmConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let bootstrap_admin = env::var("FARM_ADMIN_EMAIL")
            .ok()
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .map(|email| AdminSeed {
                full_name: env::var("FARM_ADMIN_NAME")
                    .ok()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "Farm Administrator".to_string()),
                email,
            });

        let feed_window_days = match env::var("FARM_FEED_WINDOW_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| (1..=MAX_FEED_WINDOW_DAYS).contains(days))
                .ok_or(ConfigError::InvalidFeedWindow)?,
            Err(_) => DEFAULT_FEED_WINDOW_DAYS,
        };

        Ok(Self {
            bootstrap_admin,
            feed_window_days,
        })
    }
}

/// Platform administrator seeded at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFeedWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFeedWindow => write!(
                f,
                "FARM_FEED_WINDOW_DAYS must be a whole number between 1 and {MAX_FEED_WINDOW_DAYS}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidFeedWindow => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
