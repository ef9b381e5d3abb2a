use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use rand::Rng;

use crate::workflows::permits::TransitionPolicy;

const MIN_SECRET_LEN: usize = 32;
/// Upper bound for session and signed-link lifetimes (30 days).
pub const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

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
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub permits: PermitConfig,
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

        let service_prefix =
            env::var("APP_SERVICE_PREFIX").unwrap_or_else(|_| "/api/v1".to_string());
        let service_prefix = normalize_prefix(&service_prefix)?;
        let public_url = env::var("APP_PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://{host}:{port}"));

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let storage = StorageConfig {
            bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "ridgeline-permits".to_string()),
            signing_key: load_secret("STORAGE_SIGNING_KEY", environment)?,
            signed_url_ttl_secs: parse_ttl("STORAGE_SIGNED_URL_TTL_SECS", 3600)?,
            max_upload_bytes: parse_u64("STORAGE_MAX_UPLOAD_BYTES", 5 * 1024 * 1024)? as usize,
        };

        let auth = AuthConfig {
            token_secret: load_secret("AUTH_TOKEN_SECRET", environment)?,
            session_ttl_secs: parse_ttl("AUTH_SESSION_TTL_SECS", 3600)?,
        };

        let transitions = match env::var("PERMIT_TRANSITIONS") {
            Ok(raw) => raw
                .parse::<TransitionPolicy>()
                .map_err(|_| ConfigError::InvalidTransitionPolicy { value: raw })?,
            Err(_) => TransitionPolicy::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                service_prefix,
                public_url,
            },
            telemetry: TelemetryConfig {
                log_level,
                json: environment == AppEnvironment::Production,
            },
            storage,
            auth,
            permits: PermitConfig { transitions },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path every API route is nested under, e.g. `/api/v1`.
    pub service_prefix: String,
    /// Externally reachable origin used when minting signed document links.
    pub public_url: String,
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

    /// Base URL under which stored objects are served.
    pub fn object_url_base(&self) -> String {
        format!("{}{}/storage/objects", self.public_url, self.service_prefix)
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

/// Object storage settings for uploaded permit documents.
#[derive(Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub signing_key: Vec<u8>,
    pub signed_url_ttl_secs: u64,
    pub max_upload_bytes: usize,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("signing_key", &"<redacted>")
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

/// Session token settings for the identity provider.
#[derive(Clone)]
pub struct AuthConfig {
    pub token_secret: Vec<u8>,
    pub session_ttl_secs: u64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

/// Permit review settings.
#[derive(Debug, Clone, Copy)]
pub struct PermitConfig {
    pub transitions: TransitionPolicy,
}

fn normalize_prefix(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if !trimmed.starts_with('/') {
        return Err(ConfigError::InvalidPrefix {
            value: raw.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

fn parse_ttl(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    let secs = parse_u64(var, default)?;
    if secs > MAX_TTL_SECS {
        return Err(ConfigError::TtlOutOfRange {
            var,
            max: MAX_TTL_SECS,
        });
    }
    Ok(secs)
}

fn load_secret(var: &'static str, environment: AppEnvironment) -> Result<Vec<u8>, ConfigError> {
    match env::var(var) {
        Ok(secret) if secret.len() >= MIN_SECRET_LEN => Ok(secret.into_bytes()),
        Ok(_) => Err(ConfigError::WeakSecret {
            var,
            min: MIN_SECRET_LEN,
        }),
        Err(_) if environment == AppEnvironment::Production => {
            Err(ConfigError::MissingSecret { var })
        }
        Err(_) => {
            let bytes: [u8; 32] = rand::rng().random();
            Ok(bytes.to_vec())
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPrefix { value: String },
    InvalidNumber { var: &'static str },
    TtlOutOfRange { var: &'static str, max: u64 },
    MissingSecret { var: &'static str },
    WeakSecret { var: &'static str, min: usize },
    InvalidTransitionPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPrefix { value } => {
                write!(f, "APP_SERVICE_PREFIX must start with '/' (found '{value}')")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a positive integer")
            }
            ConfigError::TtlOutOfRange { var, max } => {
                write!(f, "{var} must not exceed {max} seconds")
            }
            ConfigError::MissingSecret { var } => {
                write!(f, "{var} must be set in production")
            }
            ConfigError::WeakSecret { var, min } => {
                write!(f, "{var} must be at least {min} bytes long")
            }
            ConfigError::InvalidTransitionPolicy { value } => write!(
                f,
                "PERMIT_TRANSITIONS must be 'unrestricted' or 'guarded' (found '{value}')"
            ),
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
