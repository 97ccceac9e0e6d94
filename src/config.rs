//! Defaults for the transport client, read from a JSON file and/or the
//! environment.
//!
//! ```json
//! {
//!   "max_retries": 2,
//!   "max_wait_ms": 5000,
//!   "timeout_ms": 10000,
//!   "user_agent": "inventory-sync/1.4"
//! }
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_WAIT, DEFAULT_MIN_WAIT, RetryClient, RetryClientBuilder,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    pub max_retries: u32,
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
    /// 0 disables the client-wide timeout.
    pub timeout_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_wait_ms: DEFAULT_MIN_WAIT.as_millis() as u64,
            max_wait_ms: DEFAULT_MAX_WAIT.as_millis() as u64,
            timeout_ms: 0,
            user_agent: None,
        }
    }
}

impl TransportConfig {
    /// Loads the config from a JSON file at `path`. Missing keys keep their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config_with(format!("cannot read config '{}'", path.display()), e)
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::config_with(format!("invalid config '{}'", path.display()), e))
    }

    /// Overlays `HTTP_ACTION_*` environment variables onto `self`.
    pub fn with_env(self) -> Result<Self> {
        self.overlay(|key| std::env::var(key).ok())
    }

    fn overlay(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        fn parse<T: std::str::FromStr>(key: &str, value: String) -> Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("{key} must be a number, got '{value}'")))
        }

        if let Some(v) = var("HTTP_ACTION_MAX_RETRIES") {
            self.max_retries = parse("HTTP_ACTION_MAX_RETRIES", v)?;
        }
        if let Some(v) = var("HTTP_ACTION_MAX_WAIT_MS") {
            self.max_wait_ms = parse("HTTP_ACTION_MAX_WAIT_MS", v)?;
        }
        if let Some(v) = var("HTTP_ACTION_TIMEOUT_MS") {
            self.timeout_ms = parse("HTTP_ACTION_TIMEOUT_MS", v)?;
        }
        if let Some(v) = var("HTTP_ACTION_USER_AGENT") {
            self.user_agent = Some(v);
        }
        Ok(self)
    }

    /// A client builder carrying these settings. TLS material can still be
    /// added before building.
    pub fn client_builder(&self) -> RetryClientBuilder {
        let mut builder = RetryClient::builder()
            .max_retries(self.max_retries)
            .min_wait(Duration::from_millis(self.min_wait_ms))
            .max_wait(Duration::from_millis(self.max_wait_ms));
        if self.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(self.timeout_ms));
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder
    }

    pub fn build_client(&self) -> Result<RetryClient> {
        self.client_builder().build()
    }
}
