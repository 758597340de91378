//! Command API transport configuration.
//!
//! The daemon's command line is reserved for reconciliation parameters, so
//! the transport is configured from the environment. Only HTTP(S)
//! endpoints are accepted; `unix:` socket URLs are rejected.

use std::time::Duration;

use crate::error::{MeshError, MeshResult};

/// Environment variable holding the command API endpoint.
pub const ENV_EAPI_URL: &str = "MESH_EAPI_URL";

/// Environment variable holding the basic auth user name.
pub const ENV_EAPI_USERNAME: &str = "MESH_EAPI_USERNAME";

/// Environment variable holding the basic auth password.
pub const ENV_EAPI_PASSWORD: &str = "MESH_EAPI_PASSWORD";

/// Environment variable holding the request timeout in seconds.
pub const ENV_EAPI_TIMEOUT: &str = "MESH_EAPI_TIMEOUT_SECS";

/// Local command API endpoint.
pub const DEFAULT_EAPI_URL: &str = "http://localhost:8080/command-api";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Basic auth credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Command API client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Endpoint URL of the JSON-RPC service.
    pub url: String,
    /// Credentials, when the endpoint requires authentication.
    pub credentials: Option<Credentials>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EAPI_URL.to_string(),
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> MeshResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> MeshResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_EAPI_URL) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MeshError::invalid_config(
                    ENV_EAPI_URL,
                    format!("unsupported URL scheme: {}", url),
                ));
            }
            config.url = url;
        }

        config.credentials = match (lookup(ENV_EAPI_USERNAME), lookup(ENV_EAPI_PASSWORD)) {
            (Some(username), password) => Some(Credentials {
                username,
                password: password.unwrap_or_default(),
            }),
            (None, Some(_)) => {
                return Err(MeshError::invalid_config(
                    ENV_EAPI_PASSWORD,
                    format!("set without {}", ENV_EAPI_USERNAME),
                ));
            }
            (None, None) => None,
        };

        if let Some(secs) = lookup(ENV_EAPI_TIMEOUT) {
            let secs: u64 = secs.parse().map_err(|_| {
                MeshError::invalid_config(ENV_EAPI_TIMEOUT, format!("not a number: {}", secs))
            })?;
            if secs == 0 {
                return Err(MeshError::invalid_config(
                    ENV_EAPI_TIMEOUT,
                    "must be greater than zero",
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
