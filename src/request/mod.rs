//! The request descriptor and everything that runs it.
//!
//! An [`HttpRequest`] is a reusable, caller-owned description of one
//! outbound call. Fields can be changed freely between calls; each call
//! reads them as they are at that moment:
//!
//! 1. [`HttpRequest::resolve_client`] picks the transport handle.
//! 2. [`HttpRequest::do_http_action`] sends the request and returns the raw
//!    status and body.
//! 3. [`HttpRequest::get_body`] checks the status against the expected set
//!    and decodes the body as JSON.

mod auth;
mod context;
mod decode;
mod execute;
mod resolve;

pub use auth::Auth;
pub use context::CallContext;
pub use decode::DEFAULT_EXPECTED_STATUS;
pub use execute::ActionResponse;
pub use resolve::ClientChoice;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::certs::{CertConfig, ClientPair, build_client_pair};
use crate::error::Result;
use crate::transport::{HttpClient, RetryOverride};

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Everything needed to make one logical outbound call.
///
/// Zero retry and timeout fields mean "use the transport's defaults".
#[derive(Clone)]
pub struct HttpRequest {
    pub full_url: String,
    pub method: String,
    pub payload: Option<Vec<u8>>,
    /// Sent as `Content-Type`; an empty string sends no header.
    pub content_type: String,
    pub custom_headers: HashMap<String, String>,
    pub auth: Option<Auth>,
    /// Accepted statuses. Empty accepts only [`DEFAULT_EXPECTED_STATUS`].
    pub expected_status_codes: Vec<u16>,
    pub max_retry_count: u32,
    pub max_retry_wait: Duration,
    pub timeout: Duration,
    pub context: Option<CallContext>,
    pub client: Option<Arc<dyn HttpClient>>,
    /// Takes precedence over `client` when present.
    pub tls_client_pair: Option<ClientPair>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            full_url: url.into(),
            ..Self::default()
        }
    }

    /// A request with a TLS client pair trusting the CA bundle at
    /// `ca_bundle_path`. An empty path uses the system trust store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the
    /// bundle cannot be read or holds no usable certificate.
    pub fn with_ca(url: impl Into<String>, ca_bundle_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_certs(url, &CertConfig::with_ca_bundle(ca_bundle_path))
    }

    /// A request with a TLS client pair built from `certs`, including an
    /// optional client identity for mutual TLS.
    pub fn with_certs(url: impl Into<String>, certs: &CertConfig) -> Result<Self> {
        Ok(Self {
            full_url: url.into(),
            tls_client_pair: Some(build_client_pair(certs)?),
            ..Self::default()
        })
    }

    /// Retry limits for the next call. Zero fields defer to the client.
    pub fn retry_override(&self) -> RetryOverride {
        RetryOverride {
            max_retries: (self.max_retry_count > 0).then_some(self.max_retry_count),
            max_wait: (!self.max_retry_wait.is_zero()).then_some(self.max_retry_wait),
        }
    }
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self {
            full_url: String::new(),
            method: DEFAULT_METHOD.to_string(),
            payload: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            custom_headers: HashMap::new(),
            auth: None,
            expected_status_codes: Vec::new(),
            max_retry_count: 0,
            max_retry_wait: Duration::ZERO,
            timeout: Duration::ZERO,
            context: None,
            client: None,
            tls_client_pair: None,
        }
    }
}

/// Diagnostic one-liner for logs. Never prints payload contents or
/// credentials.
impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "URL: {}, Method: {}, Payload: ", self.full_url, self.method)?;
        match &self.payload {
            Some(payload) => write!(f, "{} bytes", payload.len()),
            None => write!(f, "none"),
        }
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("full_url", &self.full_url)
            .field("method", &self.method)
            .field("payload_len", &self.payload.as_ref().map(Vec::len))
            .field("content_type", &self.content_type)
            .field("custom_headers", &self.custom_headers)
            .field("auth", &self.auth)
            .field("expected_status_codes", &self.expected_status_codes)
            .field("max_retry_count", &self.max_retry_count)
            .field("max_retry_wait", &self.max_retry_wait)
            .field("timeout", &self.timeout)
            .field("context", &self.context)
            .field("client", &self.client.is_some())
            .field("tls_client_pair", &self.tls_client_pair)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_new_uses_defaults() {
        let req = HttpRequest::new("http://localhost/test");
        assert_eq!(req.full_url, "http://localhost/test");
        assert_eq!(req.method, "GET");
        assert_eq!(req.content_type, "application/json");
        assert!(req.payload.is_none());
        assert!(req.tls_client_pair.is_none());
        assert!(req.client.is_none());
        assert_eq!(req.retry_override(), RetryOverride::default());
        assert!(req.timeout.is_zero());
    }

    #[test]
    fn test_display_reports_payload_length_only() {
        let mut req = HttpRequest::new("http://localhost/test");
        assert_eq!(
            req.to_string(),
            "URL: http://localhost/test, Method: GET, Payload: none"
        );

        req.method = "POST".into();
        req.payload = Some(br#"{"secret":"value"}"#.to_vec());
        let shown = req.to_string();
        assert_eq!(shown, "URL: http://localhost/test, Method: POST, Payload: 18 bytes");
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_debug_hides_password() {
        let mut req = HttpRequest::new("http://localhost/test");
        req.auth = Some(Auth::new("Groot", "Baz-secret"));
        assert!(!format!("{req:?}").contains("Baz-secret"));
    }

    #[test]
    fn test_retry_override_only_carries_set_fields() {
        let mut req = HttpRequest::new("http://localhost/test");
        req.max_retry_count = 2;
        assert_eq!(
            req.retry_override(),
            RetryOverride {
                max_retries: Some(2),
                max_wait: None,
            }
        );

        req.max_retry_wait = Duration::from_secs(2);
        assert_eq!(req.retry_override().max_wait, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_with_ca_empty_path_builds_pair() {
        let req = HttpRequest::with_ca("http://localhost/test", "").unwrap();
        let pair = req.tls_client_pair.unwrap();
        assert!(pair.secure.is_some());
        assert!(pair.insecure.is_some());
        assert_eq!(req.method, "GET");
    }

    #[test]
    fn test_with_ca_bad_path_is_configuration_error() {
        let err = HttpRequest::with_ca("http://localhost/test", "/nonexistent/ca.crt").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
