//! # mportal-storehub: StoreHub customer API client
//!
//! One sync attempt is one authenticated `POST {base_url}/customers`.
//!
//! ## Attempt semantics
//!
//! 1. Serialize the [`StoreHubCustomer`] payload as JSON.
//! 2. Send with HTTP Basic auth from the configured credentials.
//! 3. Read the body as text, then try to parse it as JSON. A non-JSON body
//!    is wrapped as `{"raw": "<text>"}` and never fails the attempt.
//! 4. Classify: success iff the status is 2xx.
//!
//! Transport errors (connect, timeout, body read) are caught and returned
//! as a failed [`SyncResult`] with no HTTP status, so callers log and
//! transition every attempt the same way. The client never retries; the
//! configured timeout bounds each attempt.
//!
//! The client has no side effects beyond the outbound request.

pub mod config;
pub mod customer;
pub mod error;

pub use config::{ConfigError, StoreHubConfig};
pub use customer::StoreHubCustomer;
pub use error::StoreHubError;

use std::time::{Duration, Instant};

use serde::Serialize;
use url::Url;
use zeroize::Zeroizing;

/// Outcome of one sync attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResult {
    /// Whether the CRM accepted the customer (2xx).
    pub success: bool,
    /// HTTP status, absent when the request never got a response.
    pub http_status: Option<u16>,
    /// Response body exactly as received.
    pub raw_body: Option<String>,
    /// Response body as JSON, or `{"raw": text}` when it was not JSON.
    pub parsed_body: Option<serde_json::Value>,
    /// Wall time from just before the send to just after the body was read.
    pub duration_ms: u64,
    /// Transport error text, when the attempt failed below HTTP.
    pub transport_error: Option<String>,
}

impl SyncResult {
    /// Text recorded on the submission when the attempt failed: the raw
    /// response body for HTTP failures, the transport error otherwise.
    pub fn failure_detail(&self) -> Option<String> {
        if self.success {
            return None;
        }
        match (&self.transport_error, &self.raw_body) {
            (Some(err), _) => Some(err.clone()),
            (None, Some(body)) => Some(body.clone()),
            (None, None) => Some(String::new()),
        }
    }

    /// User-facing summary of a failed attempt.
    pub fn error_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        Some(match (self.http_status, &self.transport_error) {
            (Some(status), None) => format!("StoreHub API error: {status}"),
            (_, Some(err)) => format!("StoreHub request failed: {err}"),
            (None, None) => "StoreHub request failed".to_string(),
        })
    }

    fn transport_failure(
        started: Instant,
        http_status: Option<u16>,
        err: &reqwest::Error,
    ) -> Self {
        Self {
            success: false,
            http_status,
            raw_body: None,
            parsed_body: None,
            duration_ms: elapsed_ms(started),
            transport_error: Some(err.to_string()),
        }
    }
}

/// Request headers as recorded in the call log. Credentials are never included.
pub fn logged_request_headers() -> serde_json::Value {
    serde_json::json!({ "Content-Type": "application/json" })
}

/// Parse a response body as JSON, falling back to a raw-text envelope.
pub fn parse_body(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "raw": text }))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// StoreHub customer API client.
///
/// Cheap to clone; the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct StoreHubClient {
    http: reqwest::Client,
    customers_url: Url,
    username: String,
    password: Zeroizing<String>,
    tag: String,
}

impl std::fmt::Debug for StoreHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHubClient")
            .field("customers_url", &self.customers_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("tag", &self.tag)
            .finish()
    }
}

impl StoreHubClient {
    /// Create a client from configuration.
    pub fn new(config: StoreHubConfig) -> Result<Self, StoreHubError> {
        let customers_url = config.customers_url()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(StoreHubError::ClientInit)?;

        Ok(Self {
            http,
            customers_url,
            username: config.username,
            password: config.password,
            tag: config.tag,
        })
    }

    /// Tag attached to every customer this client creates.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn customers_url(&self) -> &Url {
        &self.customers_url
    }

    /// Perform one create-customer attempt. Never returns an error.
    pub async fn sync(&self, customer: &StoreHubCustomer) -> SyncResult {
        let started = Instant::now();
        tracing::debug!(ref_id = %customer.ref_id, url = %self.customers_url, "sending StoreHub customer create");

        let response = match self
            .http
            .post(self.customers_url.clone())
            .basic_auth(&self.username, Some(self.password.as_str()))
            .json(customer)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(ref_id = %customer.ref_id, error = %e, "StoreHub request failed before a response");
                return SyncResult::transport_failure(started, None, &e);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(ref_id = %customer.ref_id, status = status.as_u16(), error = %e, "failed to read StoreHub response body");
                return SyncResult::transport_failure(started, Some(status.as_u16()), &e);
            }
        };
        let duration_ms = elapsed_ms(started);

        let success = status.is_success();
        if success {
            tracing::info!(ref_id = %customer.ref_id, status = status.as_u16(), duration_ms, "StoreHub customer created");
        } else {
            tracing::warn!(ref_id = %customer.ref_id, status = status.as_u16(), duration_ms, "StoreHub rejected customer create");
        }

        SyncResult {
            success,
            http_status: Some(status.as_u16()),
            parsed_body: Some(parse_body(&text)),
            raw_body: Some(text),
            duration_ms,
            transport_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(http_status: Option<u16>, raw: Option<&str>, transport: Option<&str>) -> SyncResult {
        SyncResult {
            success: false,
            http_status,
            raw_body: raw.map(String::from),
            parsed_body: raw.map(parse_body),
            duration_ms: 12,
            transport_error: transport.map(String::from),
        }
    }

    #[test]
    fn parse_body_keeps_json() {
        assert_eq!(parse_body(r#"{"id":"c-1"}"#), serde_json::json!({"id": "c-1"}));
    }

    #[test]
    fn parse_body_wraps_non_json() {
        assert_eq!(
            parse_body("<html>Bad Gateway</html>"),
            serde_json::json!({"raw": "<html>Bad Gateway</html>"})
        );
        assert_eq!(parse_body(""), serde_json::json!({"raw": ""}));
    }

    #[test]
    fn http_failure_detail_is_raw_body() {
        let result = failed(Some(422), Some(r#"{"message":"duplicate"}"#), None);
        assert_eq!(
            result.failure_detail().as_deref(),
            Some(r#"{"message":"duplicate"}"#)
        );
        assert_eq!(
            result.error_message().as_deref(),
            Some("StoreHub API error: 422")
        );
    }

    #[test]
    fn transport_failure_detail_is_error_text() {
        let result = failed(None, None, Some("connection refused"));
        assert_eq!(result.failure_detail().as_deref(), Some("connection refused"));
        assert_eq!(
            result.error_message().as_deref(),
            Some("StoreHub request failed: connection refused")
        );
    }

    #[test]
    fn success_has_no_failure_detail() {
        let result = SyncResult {
            success: true,
            http_status: Some(201),
            raw_body: Some("{}".into()),
            parsed_body: Some(serde_json::json!({})),
            duration_ms: 3,
            transport_error: None,
        };
        assert!(result.failure_detail().is_none());
        assert!(result.error_message().is_none());
    }

    #[test]
    fn logged_headers_carry_no_credentials() {
        let headers = logged_request_headers();
        assert_eq!(headers, serde_json::json!({"Content-Type": "application/json"}));
        assert!(headers.get("Authorization").is_none());
    }

    #[test]
    fn client_debug_redacts_password() {
        let config = StoreHubConfig::local_mock("http://127.0.0.1:9100", "u", "s3cret").unwrap();
        let client = StoreHubClient::new(config).unwrap();
        assert!(!format!("{client:?}").contains("s3cret"));
        assert_eq!(client.customers_url().path(), "/customers");
    }
}
