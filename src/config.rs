//! Process-wide configuration.
//!
//! Read once at startup from the environment. Every value has a default, so
//! an empty environment yields a working configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `WARDEN_BIND` | `0.0.0.0:3000` |
//! | `WARDEN_SERVER_NAME` | unset (use the connection's local address) |
//! | `WARDEN_SERVER_PORT` | unset (use the connection's local port) |
//! | `WARDEN_TOR_BLOCKLIST` | [`TOR_EXIT_BLOCKLIST`] |
//! | `WARDEN_PROXY_BLOCKLIST` | [`OPEN_PROXY_BLOCKLIST`] |
//! | `WARDEN_DNSBL_TIMEOUT_MS` | `2000` |

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::reputation::{Blocklist, OPEN_PROXY_BLOCKLIST, TOR_EXIT_BLOCKLIST};

/// Configuration parse failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid socket address: {value}")]
    InvalidAddr { key: &'static str, value: String },

    #[error("{key} must be a positive integer, got {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} has an unknown placeholder in template: {value}")]
    InvalidTemplate { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    /// Name the server answers as, in place of the connection's local
    /// address. Client-supplied `Host` headers are never used.
    pub server_name: Option<String>,
    /// Port the server answers on, in place of the connection's local port.
    pub server_port: Option<u16>,
    pub tor_blocklist: Blocklist,
    pub proxy_blocklist: Blocklist,
    /// Upper bound on a single blocklist lookup.
    pub dnsbl_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            server_name: None,
            server_port: None,
            tor_blocklist: Blocklist::new(TOR_EXIT_BLOCKLIST),
            proxy_blocklist: Blocklist::new(OPEN_PROXY_BLOCKLIST),
            dnsbl_timeout: Duration::from_millis(2000),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = get("WARDEN_BIND") {
            config.bind = value
                .parse()
                .map_err(|_| ConfigError::InvalidAddr { key: "WARDEN_BIND", value })?;
        }

        config.server_name = get("WARDEN_SERVER_NAME").filter(|s| !s.is_empty());

        if let Some(value) = get("WARDEN_SERVER_PORT") {
            let port: u16 = value
                .parse()
                .ok()
                .filter(|port| *port > 0)
                .ok_or(ConfigError::InvalidNumber { key: "WARDEN_SERVER_PORT", value })?;
            config.server_port = Some(port);
        }

        if let Some(value) = get("WARDEN_TOR_BLOCKLIST") {
            config.tor_blocklist = parse_template("WARDEN_TOR_BLOCKLIST", value)?;
        }
        if let Some(value) = get("WARDEN_PROXY_BLOCKLIST") {
            config.proxy_blocklist = parse_template("WARDEN_PROXY_BLOCKLIST", value)?;
        }

        if let Some(value) = get("WARDEN_DNSBL_TIMEOUT_MS") {
            let ms: u64 = value
                .parse()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidNumber { key: "WARDEN_DNSBL_TIMEOUT_MS", value })?;
            config.dnsbl_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_template(key: &'static str, value: String) -> Result<Blocklist, ConfigError> {
    Blocklist::parse(&value).ok_or(ConfigError::InvalidTemplate { key, value })
}
