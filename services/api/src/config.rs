//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use priority_stream_core::CacheSettings;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Upper bound for the cache TTL variables, thirty days.
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub log_level: Level,
    pub cache: CacheSettings,
    pub cache_max_entries: usize,
    pub cors_allowed_origins: Vec<String>,
    /// PEM encoded RSA public key used to verify bearer tokens.
    pub auth_public_key_pem: Option<String>,
    /// Shared secret for HS256 bearer tokens, used when no public key is set.
    pub auth_jwt_secret: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address = parse_or(&lookup, "BIND_ADDRESS", SocketAddr::from(([0, 0, 0, 0], 8080)))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNS", 25u32)?;
        let db_min_connections = parse_or(&lookup, "DB_MIN_CONNS", 5u32)?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Cache Settings ---
        let stream_ttl_secs = ttl_secs(&lookup, "CACHE_STREAM_TTL_SECS", 120)?;
        let item_ttl_secs = ttl_secs(&lookup, "CACHE_ITEM_TTL_SECS", 300)?;
        let cache_max_entries = parse_or(&lookup, "CACHE_MAX_ENTRIES", 10_000usize)?;

        // --- HTTP and Auth Settings ---
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        let auth_public_key_pem = lookup("AUTH_PUBLIC_KEY_PEM").filter(|v| !v.is_empty());
        let auth_jwt_secret = lookup("AUTH_JWT_SECRET").filter(|v| !v.is_empty());

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            db_min_connections,
            log_level,
            cache: CacheSettings {
                stream_ttl: Duration::from_secs(stream_ttl_secs),
                item_ttl: Duration::from_secs(item_ttl_secs),
            },
            cache_max_entries,
            cors_allowed_origins,
            auth_public_key_pem,
            auth_jwt_secret,
        })
    }
}

/// Parses `name` if set, otherwise falls back to `default`.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Parses a cache TTL in seconds, capped at `MAX_CACHE_TTL_SECS`.
fn ttl_secs<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_or(lookup, name, default)?;
    if secs > MAX_CACHE_TTL_SECS {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("{} exceeds the maximum of {} seconds", secs, MAX_CACHE_TTL_SECS),
        ));
    }
    Ok(secs)
}
