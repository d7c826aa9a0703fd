//! Runtime configuration loaded from the environment.
//!
//! Values come from process environment variables, optionally seeded from a
//! `.env` file in the working directory (see [`Config::load`]).

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Result, ServlineError};

/// Token endpoint used when `TOKEN_URL` is not set.
pub const DEFAULT_TOKEN_URL: &str = "https://arcgis.com/sharing/rest/oauth2/token";

/// Listen address used when `SERVLINE_BIND` is not set.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Upstream request timeout used when `UPSTREAM_TIMEOUT_SECS` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the server needs to reach the feature service.
#[derive(Clone)]
pub struct Config {
    /// OAuth application client id.
    pub client_id: String,
    /// OAuth application client secret. Never logged.
    pub client_secret: String,
    /// OAuth2 token endpoint.
    pub token_url: String,
    /// Query endpoint of the service points layer.
    pub points_query_url: String,
    /// Query endpoint of the service line records layer.
    pub records_query_url: String,
    /// `addFeatures` endpoint of the service line records layer.
    pub records_add_url: String,
    /// Address the HTTP server binds to.
    pub bind: SocketAddr,
    /// Timeout applied to every upstream request.
    pub upstream_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("points_query_url", &self.points_query_url)
            .field("records_query_url", &self.records_query_url)
            .field("records_add_url", &self.records_add_url)
            .field("bind", &self.bind)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl Config {
    /// Load `.env` (if present) and then read the process environment.
    pub fn load() -> Result<Self> {
        // A missing .env file is fine; real deployments set the variables directly.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Required variables that are missing or blank produce
    /// [`ServlineError::Config`] naming the variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    ServlineError::Config(format!("Missing required environment variable: {}", key))
                })
        };

        let client_id = required("CLIENT_ID")?;
        let client_secret = required("CLIENT_SECRET")?;
        let points_query_url = required("DATA_QUERY_URL1")?;
        let records_query_url = required("DATA_QUERY_URL2")?;
        let records_add_url = required("DATA_ADD_URL1")?;

        let token_url = lookup("TOKEN_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string());

        let bind_raw = lookup("SERVLINE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse::<SocketAddr>().map_err(|e| {
            ServlineError::Config(format!("Invalid SERVLINE_BIND '{}': {}", bind_raw, e))
        })?;

        let timeout_secs = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ServlineError::Config(format!("Invalid UPSTREAM_TIMEOUT_SECS '{}': {}", raw, e))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            client_id,
            client_secret,
            token_url,
            points_query_url,
            records_query_url,
            records_add_url,
            bind,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
