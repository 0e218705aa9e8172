use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub profile: ProfileSettings,
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
            profile: ProfileSettings::from_env()?,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Overrides applied on top of the built-in item bank and classification policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSettings {
    /// Replaces the standard policy's balance threshold when present.
    pub balance_threshold: Option<f64>,
    /// CSV item bank loaded instead of the built-in scenarios.
    pub bank_csv: Option<PathBuf>,
}

impl ProfileSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let balance_threshold = match env::var("APP_BALANCE_THRESHOLD") {
            Ok(raw) => Some(parse_threshold("balance_threshold", &raw)?),
            Err(_) => None,
        };

        let bank_csv = env::var("PROFILE_BANK_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            balance_threshold,
            bank_csv,
        })
    }
}

/// Parses a non-negative, finite threshold value.
pub fn parse_threshold(name: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidThreshold {
            name,
            value: raw.to_string(),
        })?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold {
            name,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

/// Load-time failures. None of these can be repaired while the service runs.
#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidThreshold {
        name: &'static str,
        value: String,
    },
    BankRead {
        path: PathBuf,
        source: std::io::Error,
    },
    BankCsv(csv::Error),
    EmptyCategorySet,
    InvalidCategoryCode,
    DuplicateCategory(String),
    EmptyBank,
    DuplicateItem(String),
    TooFewOptions {
        item: String,
        count: usize,
    },
    DuplicateOption {
        item: String,
        label: String,
    },
    UnknownCategory {
        item: String,
        label: String,
        category: String,
    },
    DuplicateArchetype(String),
    UnknownArchetype {
        code: String,
        referenced_by: String,
    },
    UnknownPolicyCategory {
        code: String,
        referenced_by: String,
    },
    MissingPrimaryArchetype(String),
    DegeneratePair {
        category: String,
        referenced_by: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold { name, value } => write!(
                f,
                "{name} must be a non-negative number, got '{value}'"
            ),
            ConfigError::BankRead { path, source } => {
                write!(f, "unable to read item bank {}: {}", path.display(), source)
            }
            ConfigError::BankCsv(err) => write!(f, "invalid item bank CSV: {}", err),
            ConfigError::EmptyCategorySet => write!(f, "at least one category must be declared"),
            ConfigError::InvalidCategoryCode => write!(f, "category codes must not be blank"),
            ConfigError::DuplicateCategory(code) => {
                write!(f, "category '{}' is declared more than once", code)
            }
            ConfigError::EmptyBank => write!(f, "item bank contains no items"),
            ConfigError::DuplicateItem(id) => write!(f, "item '{}' is defined more than once", id),
            ConfigError::TooFewOptions { item, count } => write!(
                f,
                "item '{}' has {} option(s); at least 2 are required",
                item, count
            ),
            ConfigError::DuplicateOption { item, label } => {
                write!(f, "item '{}' repeats option label '{}'", item, label)
            }
            ConfigError::UnknownCategory {
                item,
                label,
                category,
            } => write!(
                f,
                "option '{}' of item '{}' references undeclared category '{}'",
                label, item, category
            ),
            ConfigError::DuplicateArchetype(code) => {
                write!(f, "archetype '{}' is defined more than once", code)
            }
            ConfigError::UnknownArchetype {
                code,
                referenced_by,
            } => write!(
                f,
                "{} references archetype '{}' which is missing from the catalog",
                referenced_by, code
            ),
            ConfigError::UnknownPolicyCategory {
                code,
                referenced_by,
            } => write!(
                f,
                "{} references undeclared category '{}'",
                referenced_by, code
            ),
            ConfigError::MissingPrimaryArchetype(code) => write!(
                f,
                "no primary archetype configured for category '{}'",
                code
            ),
            ConfigError::DegeneratePair {
                category,
                referenced_by,
            } => write!(
                f,
                "{} pairs category '{}' with itself",
                referenced_by, category
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::BankRead { source, .. } => Some(source),
            ConfigError::BankCsv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for ConfigError {
    fn from(err: csv::Error) -> Self {
        Self::BankCsv(err)
    }
}
