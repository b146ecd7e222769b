use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::str::FromStr;

/// Ten years.
pub const MAX_SESSION_TTL_HOURS: u64 = 87_600;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub session_ttl_hours: u64,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        let session_ttl_hours = session_ttl(&env_or("SESSION_TTL_HOURS", "168"))?;

        Ok(Self {
            http_addr,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            session_ttl_hours,
            cookie_secure: env_or_parse("COOKIE_SECURE", "false")?,
        })
    }
}

fn session_ttl(value: &str) -> Result<u64> {
    let hours: u64 = parse_value("SESSION_TTL_HOURS", value)?;
    if hours == 0 || hours > MAX_SESSION_TTL_HOURS {
        return Err(anyhow!(
            "invalid SESSION_TTL_HOURS: must be between 1 and {}",
            MAX_SESSION_TTL_HOURS
        ));
    }
    Ok(hours)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    parse_value(key, &value)
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_flags() {
        let connections: u32 = parse_value("DB_MAX_CONNECTIONS", " 10 ").unwrap();
        assert_eq!(connections, 10);

        let secure: bool = parse_value("COOKIE_SECURE", "true").unwrap();
        assert!(secure);
    }

    #[test]
    fn session_ttl_must_fit_the_allowed_range() {
        assert_eq!(session_ttl("168").unwrap(), 168);
        assert_eq!(session_ttl("87600").unwrap(), MAX_SESSION_TTL_HOURS);

        for value in ["0", "87601", "100000000", "18446744073709551615"] {
            let err = session_ttl(value).unwrap_err();
            assert!(err.to_string().starts_with("invalid SESSION_TTL_HOURS"), "{}", value);
        }
    }

    #[test]
    fn reports_the_offending_key() {
        let err = parse_value::<u64>("SESSION_TTL_HOURS", "soon").unwrap_err();
        assert!(err.to_string().starts_with("invalid SESSION_TTL_HOURS"));
    }
}
