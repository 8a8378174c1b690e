use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_punch_per_min: u32,

    pub api_prefix: String,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            db_max_connections: optional("DB_MAX_CONNECTIONS", "10")?,

            rate_protected_per_min: optional("RATE_PROTECTED_PER_MIN", "1000")?,
            rate_punch_per_min: optional("RATE_PUNCH_PER_MIN", "60")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: optional("LOG_LEVEL", "debug")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_falls_back_to_default() {
        let value: u32 = optional("TIMECARD_TEST_UNSET_RATE", "60").unwrap();
        assert_eq!(value, 60);
    }

    #[test]
    fn test_optional_parses_log_level() {
        let level: tracing::Level = optional("TIMECARD_TEST_UNSET_LEVEL", "warn").unwrap();
        assert_eq!(level, tracing::Level::WARN);
    }

    #[test]
    fn test_required_reports_missing_key() {
        let err = required("TIMECARD_TEST_UNSET_SECRET").unwrap_err();
        assert_eq!(err.to_string(), "TIMECARD_TEST_UNSET_SECRET must be set");
    }
}
