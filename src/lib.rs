//! Outbound HTTP calls with client selection, retries, status checks, and
//! JSON decoding.
//!
//! ```no_run
//! # async fn run() -> http_action::Result<()> {
//! use http_action::HttpRequest;
//! use serde_json::Value;
//!
//! let mut req = HttpRequest::with_ca("https://inventory.local/v1/nodes", "/etc/ssl/ca.pem")?;
//! req.expected_status_codes = vec![200, 204];
//! req.max_retry_count = 2;
//! let nodes: Value = req.get_body().await?;
//! # Ok(())
//! # }
//! ```

pub mod certs;
pub mod config;
pub mod error;
pub mod request;
pub mod transport;

pub use certs::{CertConfig, ClientPair, build_client_pair, build_client_pair_with};
pub use config::TransportConfig;
pub use error::{CancelReason, Error, Result};
pub use request::{ActionResponse, Auth, CallContext, ClientChoice, HttpRequest};
pub use transport::{HttpClient, RetryClient, RetryClientBuilder, RetryOverride};
