//! Runtime configuration read from environment variables.

use crate::services::reviewer_engine::DEFAULT_MAX_DRAWS;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// SQLite database file. Its parent directory is created on startup.
    pub database_path: PathBuf,
    /// Deadline for a single request; late requests get 408.
    pub request_timeout: Duration,
    /// Random draws per reviewer slot before falling back to the eligible set.
    pub max_reviewer_draws: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source. Unset or blank values take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = parse_or(var("HOST"), "HOST", "an IP address", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or(var("PORT"), "PORT", "a port number", 8080u16)?;

        let database_path = var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./reviewer-assign.db"));

        let timeout_secs: u64 = parse_or(
            var("REQUEST_TIMEOUT_SECS"),
            "REQUEST_TIMEOUT_SECS",
            "a positive number of seconds",
            10,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                expected: "a positive number of seconds",
                value: "0".into(),
            });
        }

        let max_reviewer_draws: usize = parse_or(
            var("MAX_REVIEWER_DRAWS"),
            "MAX_REVIEWER_DRAWS",
            "a positive integer",
            DEFAULT_MAX_DRAWS,
        )?;
        if max_reviewer_draws == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_REVIEWER_DRAWS",
                expected: "a positive integer",
                value: "0".into(),
            });
        }

        Ok(Config {
            host,
            port,
            database_path,
            request_timeout: Duration::from_secs(timeout_secs),
            max_reviewer_draws,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.database_path, PathBuf::from("./reviewer-assign.db"));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_reviewer_draws, DEFAULT_MAX_DRAWS);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DATABASE_PATH", "/tmp/reviews.db"),
            ("REQUEST_TIMEOUT_SECS", "3"),
            ("MAX_REVIEWER_DRAWS", "4"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.database_path, PathBuf::from("/tmp/reviews.db"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.max_reviewer_draws, 4);
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config = config_from(&[("PORT", "  ")]).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_port() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                expected: "a port number",
                value: "eighty".into(),
            }
        );
    }

    #[test]
    fn test_zero_draws_rejected() {
        assert!(config_from(&[("MAX_REVIEWER_DRAWS", "0")]).is_err());
        assert!(config_from(&[("REQUEST_TIMEOUT_SECS", "0")]).is_err());
    }
}
