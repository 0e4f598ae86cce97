//! Gateway configuration loaded from environment variables.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::relations::{COMMENT_CHUNK_SIZE, POST_CHUNK_SIZE};

/// Tunables applied to every request the gateway serves.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Max user ids per posts query.
    pub post_chunk_size: usize,
    /// Max post ids per comments query.
    pub comment_chunk_size: usize,
    /// How long a loader keeps a batch open after its first key arrives.
    pub batch_window: Duration,
    /// Upper bound on one request, after which its transaction is rolled back.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            post_chunk_size: POST_CHUNK_SIZE,
            comment_chunk_size: COMMENT_CHUNK_SIZE,
            batch_window: Duration::from_millis(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    /// Address the HTTP server binds to (default: 0.0.0.0:4000)
    pub listen_addr: SocketAddr,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `DATABASE_URL` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let defaults = GatewayConfig::default();

        Ok(Self {
            database: DatabaseConfig {
                url: vars.get("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
                acquire_timeout: Duration::from_secs(
                    vars.parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
                ),
            },
            listen_addr: vars.parse_or("LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 4000)))?,
            gateway: GatewayConfig {
                post_chunk_size: vars.parse_or("POST_CHUNK_SIZE", defaults.post_chunk_size)?,
                comment_chunk_size: vars
                    .parse_or("COMMENT_CHUNK_SIZE", defaults.comment_chunk_size)?,
                batch_window: Duration::from_millis(
                    vars.parse_or("BATCH_WINDOW_MS", defaults.batch_window.as_millis() as u64)?,
                ),
                request_timeout: Duration::from_secs(
                    vars.parse_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout.as_secs())?,
                ),
            },
        })
    }
}

struct Vars<L>(L);

impl<L> Vars<L>
where
    L: Fn(&str) -> Option<String>,
{
    /// Unset and blank variables both read as missing.
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn parse_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(name) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid {} value '{}': {}", name, value, e)),
            None => Ok(default),
        }
    }
}
