use async_trait::async_trait;
use reqwest::{Request, Response};
use std::time::Duration;

use crate::error::Result;

/// Per-call retry limits. `None` keeps the client's own default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryOverride {
    pub max_retries: Option<u32>,
    pub max_wait: Option<Duration>,
}

/// A transport client handle that descriptors can share.
///
/// Implementations must treat `retry` as scoped to this one call.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request, retry: RetryOverride) -> Result<Response>;
}
