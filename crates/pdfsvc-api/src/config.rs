//! Server configuration from environment variables.
//!
//! | Variable                  | Default                       |
//! |---------------------------|-------------------------------|
//! | `DATABASE_URL`            | `postgres://localhost/pdfsvc` |
//! | `HOST`                    | `0.0.0.0`                     |
//! | `PORT`                    | `3000`                        |
//! | `DB_MAX_CONNECTIONS`      | `10`                          |
//! | `DB_ACQUIRE_TIMEOUT_SECS` | `30`                          |
//! | `MAX_BODY_BYTES`          | `67108864` (64 MiB)           |
//! | `ALLOWED_ORIGINS`         | `http://localhost:3000`       |
//! | `RUN_MIGRATIONS`          | `true`                        |
//! | `LOG_FORMAT`              | `text` (`text` or `json`)     |
//! | `LOG_FILE`                | unset (stdout only)           |
//! | `LOG_ANSI`                | auto                          |
//!
//! `RUST_LOG` is read by the tracing filter directly.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use pdfsvc_core::{Error, Result};

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/pdfsvc";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;
/// Base64 inflates payloads by a third, so this admits PDFs of roughly 48 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging settings consumed by the binary's subscriber setup.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Daily-rolled log file; stdout when unset.
    pub file: Option<String>,
    /// Force ANSI colours on or off.
    pub ansi: Option<bool>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            file: None,
            ansi: None,
        }
    }
}

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// Longest a request waits for a pooled connection.
    pub db_acquire_timeout: Duration,
    pub max_body_bytes: usize,
    pub allowed_origins: Vec<String>,
    pub run_migrations: bool,
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_acquire_timeout: Duration::from_secs(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            run_migrations: true,
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value.
    ///
    /// Unset variables take their defaults; set but malformed values fail
    /// with [`Error::Config`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(Error::Config(format!(
                    "LOG_FORMAT must be \"text\" or \"json\", got {:?}",
                    other
                )))
            }
        };

        let config = Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_var(&get, "PORT", defaults.port)?,
            db_max_connections: parse_var(&get, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_acquire_timeout: Duration::from_secs(parse_var(
                &get,
                "DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
            )?),
            max_body_bytes: parse_var(&get, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|v| split_origins(&v))
                .unwrap_or(defaults.allowed_origins),
            run_migrations: match get("RUN_MIGRATIONS") {
                Some(v) => parse_bool("RUN_MIGRATIONS", &v)?,
                None => defaults.run_migrations,
            },
            log: LogConfig {
                format: log_format,
                file: get("LOG_FILE"),
                ansi: get("LOG_ANSI")
                    .map(|v| parse_bool("LOG_ANSI", &v))
                    .transpose()?,
            },
        };

        if config.db_max_connections == 0 {
            return Err(Error::Config(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if config.db_acquire_timeout.is_zero() {
            return Err(Error::Config(
                "DB_ACQUIRE_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        if config.max_body_bytes == 0 {
            return Err(Error::Config("MAX_BODY_BYTES must be positive".to_string()));
        }
        Ok(config)
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid HOST/PORT: {}", e)))
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} has invalid value {:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(Error::Config(format!(
            "{} must be true or false, got {:?}",
            key, other
        ))),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 3000);
        assert!(config.run_migrations);
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "5"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("RUN_MIGRATIONS", "false"),
            ("LOG_FORMAT", "json"),
            ("LOG_ANSI", "0"),
            ("LOG_FILE", "/var/log/pdfsvc/api.log"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 4);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(5));
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(!config.run_migrations);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.ansi, Some(false));
        assert_eq!(config.log.file.as_deref(), Some("/var/log/pdfsvc/api.log"));
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "  "), ("HOST", "")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_malformed_values_rejected() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("PORT", "70000"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "0"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "soon"),
            ("MAX_BODY_BYTES", "-1"),
            ("RUN_MIGRATIONS", "maybe"),
            ("LOG_FORMAT", "xml"),
        ] {
            let result = ServerConfig::from_lookup(lookup(&[(key, value)]));
            assert!(
                matches!(result, Err(Error::Config(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }
}
