//! StoreHub client error types.
//!
//! Only client construction can fail. A sync attempt never returns an
//! error: HTTP and transport failures are folded into
//! [`SyncResult`](crate::SyncResult).

/// Errors building a [`StoreHubClient`](crate::StoreHubClient).
#[derive(Debug, thiserror::Error)]
pub enum StoreHubError {
    /// The underlying HTTP client could not be built.
    #[error("failed to build StoreHub HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}
