use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::{Body, Method, Request, Url};
use std::time::Instant;
use tracing::debug;

use super::{ClientChoice, HttpRequest};
use crate::error::{Error, Result};
use crate::transport::{HttpClient, RetryClient};

/// Raw outcome of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpRequest {
    /// Sends the request through the resolved client and returns the raw
    /// status and body. The status is not checked here.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for an empty or unusable URL, method, or
    ///   header, before any network I/O.
    /// - [`Error::Configuration`] when a TLS pair is attached with both
    ///   handles cleared, or the default client cannot be built.
    /// - [`Error::Cancelled`] when the call context finishes first.
    /// - [`Error::Transport`] for network failures the transport gave up on.
    #[tracing::instrument(
        level = "debug",
        skip(self),
        fields(url = %self.full_url, method = %self.method)
    )]
    pub async fn do_http_action(&self) -> Result<ActionResponse> {
        let request = self.build_request()?;

        let choice = self.resolve_client();
        let kind = choice.kind();
        if matches!(choice, ClientChoice::InsecureFallback(_)) {
            debug!("Secure client cleared, using insecure client");
        }
        let default_client;
        let client: &dyn HttpClient = match choice {
            ClientChoice::Secure(c) | ClientChoice::InsecureFallback(c) | ClientChoice::Explicit(c) => {
                c.as_ref()
            }
            ClientChoice::Default => {
                default_client = RetryClient::builder().build()?;
                &default_client
            }
            ClientChoice::Unresolved => {
                return Err(Error::config(
                    "TLS client pair has neither a secure nor an insecure client",
                ));
            }
        };

        let retry = self.retry_override();
        let started = Instant::now();
        let exchange = async {
            let response = client.execute(request, retry).await?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(Error::Transport)?;
            Ok::<_, Error>(ActionResponse { status, body })
        };

        let result = match &self.context {
            Some(ctx) => ctx.run(exchange).await.map_err(Error::Cancelled).and_then(|r| r),
            None => exchange.await,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => debug!(
                client = kind,
                status = response.status,
                bytes = response.body.len(),
                elapsed_ms,
                "HTTP action complete"
            ),
            Err(e) => debug!(client = kind, error = %e, elapsed_ms, "HTTP action failed"),
        }
        result
    }

    /// Turns the descriptor into a transport request. Pure: no I/O.
    pub(crate) fn build_request(&self) -> Result<Request> {
        if self.full_url.is_empty() {
            return Err(Error::Validation("request has no URL".into()));
        }
        let url = Url::parse(&self.full_url)
            .map_err(|e| Error::Validation(format!("invalid URL '{}': {e}", self.full_url)))?;

        let method = if self.method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(self.method.as_bytes())
                .map_err(|_| Error::Validation(format!("invalid method '{}'", self.method)))?
        };

        let mut request = Request::new(method, url);
        let headers = request.headers_mut();

        if !self.content_type.is_empty() {
            let value = HeaderValue::from_str(&self.content_type).map_err(|_| {
                Error::Validation(format!("invalid content type '{}'", self.content_type))
            })?;
            headers.insert(CONTENT_TYPE, value);
        }

        for (name, value) in &self.custom_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::Validation(format!("invalid header name '{name}'")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::Validation(format!("invalid value for header '{name}'")))?;
            headers.insert(name, value);
        }

        if let Some(auth) = &self.auth {
            auth.apply(headers)?;
        }

        if let Some(payload) = &self.payload {
            *request.body_mut() = Some(Body::from(payload.clone()));
        }
        if !self.timeout.is_zero() {
            *request.timeout_mut() = Some(self.timeout);
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::ClientPair;
    use crate::request::Auth;
    use reqwest::header::AUTHORIZATION;
    use std::time::Duration;

    #[test]
    fn test_build_request_applies_descriptor() {
        let mut req = HttpRequest::new("http://localhost:8080/test");
        req.method = "POST".into();
        req.payload = Some(b"{}".to_vec());
        req.custom_headers
            .insert("HMS-Service".into(), "smd-loader".into());
        req.auth = Some(Auth::new("Groot", "Baz"));
        req.timeout = Duration::from_secs(10);

        let built = req.build_request().unwrap();
        assert_eq!(built.method(), &Method::POST);
        assert_eq!(built.url().as_str(), "http://localhost:8080/test");
        assert_eq!(built.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(built.headers()["hms-service"], "smd-loader");
        assert!(built.headers().contains_key(AUTHORIZATION));
        assert_eq!(built.timeout(), Some(&Duration::from_secs(10)));
        assert_eq!(built.body().and_then(Body::as_bytes), Some(&b"{}"[..]));
    }

    #[test]
    fn test_build_request_without_payload_or_content_type() {
        let mut req = HttpRequest::new("http://localhost/test");
        req.content_type.clear();

        let built = req.build_request().unwrap();
        assert_eq!(built.method(), &Method::GET);
        assert!(built.body().is_none());
        assert!(built.headers().get(CONTENT_TYPE).is_none());
        assert!(built.timeout().is_none());
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        let mut req = HttpRequest::new("");
        assert!(matches!(req.build_request(), Err(Error::Validation(_))));

        req.full_url = "not a url".into();
        assert!(matches!(req.build_request(), Err(Error::Validation(_))));

        req.full_url = "http://localhost/test".into();
        req.method = "GE T".into();
        assert!(matches!(req.build_request(), Err(Error::Validation(_))));

        req.method = "GET".into();
        req.custom_headers.insert("bad header".into(), "x".into());
        assert!(matches!(req.build_request(), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_url_fails_before_resolution() {
        let mut req = HttpRequest::new("");
        req.tls_client_pair = Some(ClientPair::default());
        let err = req.do_http_action().await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_unresolved_client_is_configuration_error() {
        let mut req = HttpRequest::new("http://a.b.c/xyzzy");
        req.tls_client_pair = Some(ClientPair::default());
        let err = req.do_http_action().await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
