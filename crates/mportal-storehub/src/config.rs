//! StoreHub client configuration.
//!
//! Resolved once at process start. Defaults point to the production
//! StoreHub API; override via environment variables or explicit
//! construction for staging and tests.

use url::Url;
use zeroize::Zeroizing;

/// Default tag attached to every customer created by the portal.
pub const DEFAULT_TAG: &str = "MemberPortal";

/// Configuration for the StoreHub customer API.
///
/// Custom `Debug` implementation redacts the password to prevent
/// credential leakage in log output.
#[derive(Clone)]
pub struct StoreHubConfig {
    /// Base URL of the StoreHub API. The customer endpoint is
    /// `{base_url}/customers`.
    /// Default: <https://api.storehubhq.com>
    pub base_url: Url,
    /// HTTP Basic auth username.
    pub username: String,
    /// HTTP Basic auth password. Zeroized on drop.
    pub password: Zeroizing<String>,
    /// Tag attached to created customers.
    pub tag: String,
    /// Request timeout in seconds. Bounds one sync attempt.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for StoreHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHubConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("tag", &self.tag)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl StoreHubConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `STOREHUB_USERNAME` (required)
    /// - `STOREHUB_PASSWORD` (required)
    /// - `STOREHUB_API_URL` (default: `https://api.storehubhq.com`)
    /// - `STOREHUB_TAG` (default: `MemberPortal`)
    /// - `STOREHUB_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let username =
            std::env::var("STOREHUB_USERNAME").map_err(|_| ConfigError::MissingUsername)?;
        let password = std::env::var("STOREHUB_PASSWORD")
            .map(Zeroizing::new)
            .map_err(|_| ConfigError::MissingPassword)?;

        Ok(Self {
            base_url: env_url("STOREHUB_API_URL", "https://api.storehubhq.com")?,
            username,
            password,
            tag: std::env::var("STOREHUB_TAG").unwrap_or_else(|_| DEFAULT_TAG.to_string()),
            timeout_secs: std::env::var("STOREHUB_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Create a configuration pointing at a local mock server (for testing).
    pub fn local_mock(base_url: &str, username: &str, password: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?,
            username: username.to_string(),
            password: Zeroizing::new(password.to_string()),
            tag: DEFAULT_TAG.to_string(),
            timeout_secs: 5,
        })
    }

    /// Full URL of the customer create endpoint.
    ///
    /// `customers` is appended as a path segment, so a base URL with a path
    /// (`https://proxy.example.com/storehub`) keeps it, with or without a
    /// trailing slash.
    pub fn customers_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ConfigError::InvalidUrl(self.base_url.to_string(), "cannot be a base URL".into())
            })?
            .pop_if_empty()
            .push("customers");
        Ok(url)
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("STOREHUB_USERNAME environment variable is required")]
    MissingUsername,
    #[error("STOREHUB_PASSWORD environment variable is required")]
    MissingPassword,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
