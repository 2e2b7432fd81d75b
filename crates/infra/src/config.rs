//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::retry::RetryPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the ledger service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// `LISTEN_ADDR`
    pub listen_addr: SocketAddr,
    /// `DATABASE_URL`; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// `DB_MAX_CONNECTIONS`
    pub db_max_connections: u32,
    /// `STORE_TIMEOUT_MS`: bound on every single store call.
    pub store_timeout: Duration,
    /// `LEDGER_MAX_ATTEMPTS`, `LEDGER_BACKOFF_BASE_MS`, `LEDGER_BACKOFF_MAX_MS`
    pub retry: RetryPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            db_max_connections: 10,
            store_timeout: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Load from the process environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (handy for tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = parse_or("LISTEN_ADDR", &lookup, defaults.listen_addr)?;
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let db_max_connections =
            parse_or("DB_MAX_CONNECTIONS", &lookup, defaults.db_max_connections)?;
        let store_timeout_ms = parse_or(
            "STORE_TIMEOUT_MS",
            &lookup,
            defaults.store_timeout.as_millis() as u64,
        )?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "STORE_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let max_attempts = parse_or("LEDGER_MAX_ATTEMPTS", &lookup, defaults.retry.max_attempts)?;
        let base_ms = parse_or(
            "LEDGER_BACKOFF_BASE_MS",
            &lookup,
            defaults.retry.base_delay.as_millis() as u64,
        )?;
        let max_ms = parse_or(
            "LEDGER_BACKOFF_MAX_MS",
            &lookup,
            defaults.retry.max_delay.as_millis() as u64,
        )?;

        Ok(Self {
            listen_addr,
            database_url,
            db_max_connections,
            store_timeout: Duration::from_millis(store_timeout_ms),
            retry: RetryPolicy::new(
                max_attempts,
                Duration::from_millis(base_ms),
                Duration::from_millis(max_ms),
            ),
        })
    }
}

fn parse_or<T, F>(var: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<LedgerConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LedgerConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(load(&[]).unwrap(), LedgerConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = load(&[
            ("LISTEN_ADDR", "127.0.0.1:4000"),
            ("DATABASE_URL", "postgres://ledger@localhost/ledger"),
            ("STORE_TIMEOUT_MS", "1500"),
            ("LEDGER_MAX_ATTEMPTS", "8"),
            ("LEDGER_BACKOFF_BASE_MS", "0"),
        ])
        .unwrap();

        assert_eq!(cfg.listen_addr.port(), 4000);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://ledger@localhost/ledger"));
        assert_eq!(cfg.store_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.retry.max_attempts, 8);
        assert_eq!(cfg.retry.base_delay, Duration::ZERO);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let cfg = load(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn unparsable_value_names_the_variable() {
        let err = load(&[("LEDGER_MAX_ATTEMPTS", "lots")]).unwrap_err();
        match err {
            ConfigError::Invalid { var, value, .. } => {
                assert_eq!(var, "LEDGER_MAX_ATTEMPTS");
                assert_eq!(value, "lots");
            }
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(load(&[("STORE_TIMEOUT_MS", "0")]).is_err());
    }
}
