//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.
//! Token settings have no defaults: a missing or invalid value aborts startup.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;

pub const ENV_JWT_SECRET_KEY: &str = "JWT_SECRET_KEY";
pub const ENV_JWT_ALGORITHM: &str = "JWT_ALGORITHM";
pub const ENV_JWT_ACCESS_EXPIRE_MINUTES: &str = "JWT_ACCESS_TOKEN_EXPIRE_MINUTES";
pub const ENV_JWT_REFRESH_EXPIRE_DAYS: &str = "JWT_REFRESH_TOKEN_EXPIRE_DAYS";
pub const ENV_API_HOST: &str = "API_HOST";
pub const ENV_API_PORT: &str = "API_PORT";
pub const ENV_API_PREFIX: &str = "API_PREFIX";
pub const ENV_CORS_ORIGINS: &str = "CORS_ORIGINS";
pub const ENV_BOOTSTRAP_USER: &str = "AUTH_BOOTSTRAP_USER";
pub const ENV_BOOTSTRAP_PASSWORD: &str = "AUTH_BOOTSTRAP_PASSWORD";

const DEFAULT_API_HOST: &str = "127.0.0.1";
const DEFAULT_API_PORT: u16 = 8000;
const DEFAULT_API_PREFIX: &str = "/api";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

/// Configuration errors, reported once at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Unsupported signing algorithm: {0} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("{0} lifetime must be positive")]
    NonPositiveLifetime(&'static str),

    #[error("{0} lifetime is too large")]
    LifetimeOutOfRange(&'static str),
}

/// Signing and lifetime settings for issued tokens
///
/// Immutable once built. Construction validates every field, so a
/// `TokenConfig` in hand is always usable.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    algorithm: Algorithm,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenConfig {
    /// Build a token configuration
    ///
    /// `algorithm` is a JWA name; only the HMAC family is accepted since the
    /// secret is symmetric.
    pub fn new(
        secret: impl Into<String>,
        algorithm: &str,
        access_lifetime: Duration,
        refresh_lifetime: Duration,
    ) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let algorithm = parse_algorithm(algorithm)?;

        check_lifetime("Access token", access_lifetime)?;
        check_lifetime("Refresh token", refresh_lifetime)?;

        Ok(Self {
            secret,
            algorithm,
            access_lifetime,
            refresh_lifetime,
        })
    }

    /// Read token settings through `lookup` (an environment accessor)
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = required(lookup, ENV_JWT_SECRET_KEY)?;
        let algorithm = required(lookup, ENV_JWT_ALGORITHM)?;
        let access_minutes: i64 = parse_required(lookup, ENV_JWT_ACCESS_EXPIRE_MINUTES)?;
        let refresh_days: i64 = parse_required(lookup, ENV_JWT_REFRESH_EXPIRE_DAYS)?;

        let access_lifetime =
            Duration::try_minutes(access_minutes).ok_or_else(|| ConfigError::Invalid {
                key: ENV_JWT_ACCESS_EXPIRE_MINUTES,
                reason: format!("{access_minutes} minutes is out of range"),
            })?;
        let refresh_lifetime =
            Duration::try_days(refresh_days).ok_or_else(|| ConfigError::Invalid {
                key: ENV_JWT_REFRESH_EXPIRE_DAYS,
                reason: format!("{refresh_days} days is out of range"),
            })?;

        Self::new(secret, &algorithm, access_lifetime, refresh_lifetime)
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn access_lifetime(&self) -> Duration {
        self.access_lifetime
    }

    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh_lifetime
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish()
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix the auth routes are nested under, e.g. `/api`
    pub api_prefix: String,
    pub cors_origins: Vec<String>,
    /// Optional `(username, password)` seeded into the user store at startup
    pub bootstrap_user: Option<(String, String)>,
}

impl ServerConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_API_HOST).unwrap_or_else(|| DEFAULT_API_HOST.to_string());

        let port = match lookup(ENV_API_PORT) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_API_PORT,
                reason: format!("'{raw}' is not a port number"),
            })?,
            None => DEFAULT_API_PORT,
        };

        let api_prefix = normalize_prefix(
            &lookup(ENV_API_PREFIX).unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
        );

        let cors_origins = lookup(ENV_CORS_ORIGINS)
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let bootstrap_user = match (lookup(ENV_BOOTSTRAP_USER), lookup(ENV_BOOTSTRAP_PASSWORD)) {
            (Some(user), Some(password)) => Some((user, password)),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(ENV_BOOTSTRAP_PASSWORD)),
            (None, Some(_)) => return Err(ConfigError::Missing(ENV_BOOTSTRAP_USER)),
        };

        Ok(Self {
            host,
            port,
            api_prefix,
            cors_origins,
            bootstrap_user,
        })
    }

    /// `host:port` string suitable for binding a listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: TokenConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            token: TokenConfig::from_lookup(lookup)?,
            server: ServerConfig::from_lookup(lookup)?,
        })
    }
}

fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| ConfigError::UnsupportedAlgorithm(name.to_string()))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// A lifetime must be positive and yield a representable expiry from now
fn check_lifetime(name: &'static str, lifetime: Duration) -> Result<(), ConfigError> {
    if lifetime <= Duration::zero() {
        return Err(ConfigError::NonPositiveLifetime(name));
    }
    if Utc::now().checked_add_signed(lifetime).is_none() {
        return Err(ConfigError::LifetimeOutOfRange(name));
    }
    Ok(())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or(ConfigError::Missing(key))
}

fn parse_required<F, T>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = required(lookup, key)?;
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("'{raw}' is not a number"),
    })
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
