use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    /// Seconds.
    pub access_token_ttl: u64,

    pub upload_dir: String,
    pub max_upload_bytes: usize,
    /// Used for file URLs until an admin sets the website base URL.
    pub fallback_base_url: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; missing required keys and values that
    /// fail to parse are reported by name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };
        let or_default = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            server_addr: or_default("SERVER_ADDR", "0.0.0.0:8080"),
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse(&lookup, "ACCESS_TOKEN_TTL", 7200)?, // 2 hours

            upload_dir: or_default("UPLOAD_DIR", "uploads"),
            max_upload_bytes: parse(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            fallback_base_url: or_default("FALLBACK_BASE_URL", "http://localhost:8080"),

            rate_login_per_min: parse(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parse(&lookup, "RATE_REGISTER_PER_MIN", 30)?,
            rate_protected_per_min: parse(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: or_default("API_PREFIX", "/api"),

            log_dir: or_default("LOG_DIR", "logs"),
            log_level: or_default("LOG_LEVEL", "info"),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}
