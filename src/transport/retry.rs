use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Certificate, Identity, Request, Response, StatusCode};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::client::{HttpClient, RetryOverride};
use crate::error::{Error, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 4;
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30);

/// The default transport: a pooled `reqwest::Client` that retries connect
/// failures, timeouts, 429 and most 5xx responses with exponential backoff.
///
/// Limits passed to [`HttpClient::execute`] apply to that call only, so one
/// `RetryClient` can be shared by any number of descriptors.
#[derive(Debug, Clone)]
pub struct RetryClient {
    client: reqwest::Client,
    max_retries: u32,
    min_wait: Duration,
    max_wait: Duration,
}

impl RetryClient {
    pub fn new() -> Self {
        Self::from_client(reqwest::Client::new())
    }

    /// Wraps an already configured `reqwest::Client` with the default limits.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            min_wait: DEFAULT_MIN_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    pub fn builder() -> RetryClientBuilder {
        RetryClientBuilder::default()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

impl Default for RetryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one attempt that did not produce a final response.
enum Attempt {
    Status(Response),
    Transport(reqwest::Error),
    Unrepeatable,
}

#[async_trait]
impl HttpClient for RetryClient {
    async fn execute(&self, req: Request, retry: RetryOverride) -> Result<Response> {
        let max_retries = retry.max_retries.unwrap_or(self.max_retries);
        let max_wait = retry.max_wait.unwrap_or(self.max_wait);

        if max_retries == 0 || req.try_clone().is_none() {
            return self.client.execute(req).await.map_err(Error::Transport);
        }

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.min_wait.min(max_wait))
            .with_max_interval(max_wait)
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build();

        let client = &self.client;
        let template = &req;
        let attempts = AtomicU32::new(0);

        let outcome = backoff::future::retry(policy, || {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed);
            let next = template.try_clone();
            async move {
                let Some(next) = next else {
                    return Err(backoff::Error::permanent(Attempt::Unrepeatable));
                };
                let last = attempt >= max_retries;

                match client.execute(next).await {
                    Ok(resp) if !last && is_retryable_status(resp.status()) => {
                        warn!(
                            attempt,
                            max_retries,
                            status = resp.status().as_u16(),
                            "Retryable status, backing off"
                        );
                        match retry_after(resp.headers(), max_wait) {
                            Some(wait) => Err(backoff::Error::retry_after(Attempt::Status(resp), wait)),
                            None => Err(backoff::Error::transient(Attempt::Status(resp))),
                        }
                    }
                    Ok(resp) => {
                        if attempt > 0 {
                            debug!(attempt, status = resp.status().as_u16(), "Finished after retries");
                        }
                        Ok(resp)
                    }
                    Err(e) if !last && is_retryable_error(&e) => {
                        warn!(attempt, max_retries, error = %e, "Transport failure, backing off");
                        Err(backoff::Error::transient(Attempt::Transport(e)))
                    }
                    Err(e) => Err(backoff::Error::permanent(Attempt::Transport(e))),
                }
            }
        })
        .await;

        match outcome {
            Ok(resp) => Ok(resp),
            Err(Attempt::Status(resp)) => Ok(resp),
            Err(Attempt::Transport(e)) => Err(Error::Transport(e)),
            Err(Attempt::Unrepeatable) => Err(Error::config("request body cannot be replayed")),
        }
    }
}

/// 429 and every 5xx except 501 are worth another attempt.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Reads a `Retry-After` delay given in seconds, capped at `max_wait`.
fn retry_after(headers: &HeaderMap, max_wait: Duration) -> Option<Duration> {
    let secs: u64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs).min(max_wait))
}

/// Configures a [`RetryClient`] and the `reqwest::Client` underneath it.
#[derive(Clone, Default)]
pub struct RetryClientBuilder {
    max_retries: Option<u32>,
    min_wait: Option<Duration>,
    max_wait: Option<Duration>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    root_certificates: Vec<Certificate>,
    identity: Option<Identity>,
}

impl RetryClientBuilder {
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn min_wait(mut self, wait: Duration) -> Self {
        self.min_wait = Some(wait);
        self
    }

    pub fn max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = Some(wait);
        self
    }

    /// Total timeout applied to every request sent by this client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Trusts `cert` in addition to the system roots.
    pub fn add_root_certificate(mut self, cert: Certificate) -> Self {
        self.root_certificates.push(cert);
        self
    }

    /// Presents `identity` to servers that request a client certificate.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn build(self) -> Result<RetryClient> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        for cert in self.root_certificates {
            builder = builder.add_root_certificate(cert);
        }
        if let Some(identity) = self.identity {
            builder = builder.identity(identity);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config_with("failed to build HTTP client", e))?;

        Ok(RetryClient {
            client,
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            min_wait: self.min_wait.unwrap_or(DEFAULT_MIN_WAIT),
            max_wait: self.max_wait.unwrap_or(DEFAULT_MAX_WAIT),
        })
    }
}
