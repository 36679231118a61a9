//! Process configuration loaded from the environment.
//!
//! DESIGN
//! ======
//! Everything is optional. Unparseable numbers fall back to their defaults so
//! a typo in a tuning knob never blocks startup; only choices that change
//! which collaborators get wired (`AUTH_MODE`, `BIND_ADDR`) are hard errors.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CLIENT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_POINTER_THROTTLE_MS: u64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown AUTH_MODE `{0}` (expected `dev` or `session`)")]
    UnknownAuthMode(String),
    #[error("AUTH_MODE=session requires DATABASE_URL")]
    SessionWithoutDatabase,
    #[error("invalid BIND_ADDR `{0}`")]
    InvalidBindAddr(String),
}

/// How bearer tokens are turned into identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// The token is the user id. Local development and tests only.
    Dev,
    /// Tokens are looked up in the `sessions` table.
    Session,
}

impl AuthMode {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "session" => Ok(Self::Session),
            _ => Err(ConfigError::UnknownAuthMode(raw.to_owned())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub database_url: Option<String>,
    pub auth_mode: AuthMode,
    pub db_max_connections: u32,
    /// Bound of each connection's outbound frame queue.
    pub client_channel_capacity: usize,
    /// Minimum spacing of relayed pointer updates per connection.
    pub pointer_throttle: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            database_url: None,
            auth_mode: AuthMode::Dev,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            client_channel_capacity: DEFAULT_CLIENT_CHANNEL_CAPACITY,
            pointer_throttle: Duration::from_millis(DEFAULT_POINTER_THROTTLE_MS),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `AUTH_MODE`, for `session` auth without
    /// a database, or for a `BIND_ADDR` that is not an IP address.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let auth_mode = match lookup("AUTH_MODE") {
            Some(raw) => AuthMode::parse(&raw)?,
            None if database_url.is_some() => AuthMode::Session,
            None => AuthMode::Dev,
        };
        if auth_mode == AuthMode::Session && database_url.is_none() {
            return Err(ConfigError::SessionWithoutDatabase);
        }

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidBindAddr(raw))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        Ok(Self {
            bind_addr,
            port: env_parse(&lookup, "PORT", DEFAULT_PORT),
            database_url,
            auth_mode,
            db_max_connections: env_parse(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            client_channel_capacity: env_parse(&lookup, "CLIENT_CHANNEL_CAPACITY", DEFAULT_CLIENT_CHANNEL_CAPACITY)
                .max(1),
            pointer_throttle: Duration::from_millis(env_parse(
                &lookup,
                "POINTER_THROTTLE_MS",
                DEFAULT_POINTER_THROTTLE_MS,
            )),
        })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
