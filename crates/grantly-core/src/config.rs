//! Configuration module
//!
//! Environment-driven configuration for the API service. Values come from
//! the process environment (a `.env` file is loaded by the binary before
//! this runs).

use std::env;

use anyhow::Context;

// Defaults
const DEFAULT_SERVER_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
// Uploads are plain text CSV; 5 MiB covers tens of thousands of rows.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        Ok(Self {
            server_port: parse_env_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            database_url,
            db_max_connections: parse_env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            max_upload_bytes: parse_env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

fn parse_env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_or_uses_default_when_unset() {
        let value: u16 = parse_env_or("GRANTLY_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn test_parse_env_or_rejects_garbage() {
        std::env::set_var("GRANTLY_TEST_BAD_PORT", "not-a-number");
        let result: anyhow::Result<u16> = parse_env_or("GRANTLY_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
        std::env::remove_var("GRANTLY_TEST_BAD_PORT");
    }
}
