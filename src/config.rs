use std::env;
use std::net::SocketAddr;

use chrono::Duration;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://rollbook.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SESSION_TTL_HOURS: i64 = 48;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 100;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub session_ttl: Duration,
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Config {
    /// Reads `DATABASE_URL`, `BIND_ADDR`, `SESSION_TTL_HOURS` and
    /// `DB_MAX_CONNECTIONS`, falling back to defaults for unset variables.
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let session_ttl = match env::var("SESSION_TTL_HOURS") {
            Ok(v) => parse_session_ttl(&v)?,
            Err(_) => Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        };

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::Config(format!("DB_MAX_CONNECTIONS is invalid: {}", v)))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            bind_addr,
            session_ttl,
            max_connections,
        })
    }
}

/// Session lifetime in whole hours, between one hour and a century.
pub fn parse_session_ttl(raw: &str) -> Result<Duration, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|h| (1..=MAX_SESSION_TTL_HOURS).contains(h))
        .map(Duration::hours)
        .ok_or_else(|| AppError::Config(format!("SESSION_TTL_HOURS is invalid: {}", raw)))
}
