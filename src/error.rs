//! Error type shared by every request operation.
//!
//! Each failure is classified so callers can decide whether to retry with a
//! different descriptor, log, or give up. Only [`Error::UnexpectedStatus`]
//! carries response data alongside the failure.

use bytes::Bytes;
use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a call context stopped an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The context's token was cancelled explicitly.
    Cancelled,
    /// The context's deadline passed before the exchange finished.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "context cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The descriptor cannot produce a request. Raised before any network I/O.
    #[error("invalid request: {0}")]
    Validation(String),

    /// TLS material or client handles are missing or unusable.
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// DNS, connect, TLS handshake, timeout, or body read failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request aborted: {0}")]
    Cancelled(CancelReason),

    /// The exchange completed but the status is outside the acceptance set.
    #[error("unexpected HTTP status {status} ({} byte body)", .body.len())]
    UnexpectedStatus { status: u16, body: Bytes },

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn config_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the HTTP status for [`Error::UnexpectedStatus`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body for [`Error::UnexpectedStatus`].
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Error::UnexpectedStatus { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    /// `true` for transport timeouts and context deadlines alike.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout(),
            Error::Cancelled(reason) => *reason == CancelReason::DeadlineExceeded,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_exposes_status_and_body() {
        let err = Error::UnexpectedStatus {
            status: 404,
            body: Bytes::from_static(b"missing"),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body().map(|b| b.as_ref()), Some(&b"missing"[..]));
        assert_eq!(err.to_string(), "unexpected HTTP status 404 (7 byte body)");
    }

    #[test]
    fn test_deadline_counts_as_timeout() {
        let err = Error::Cancelled(CancelReason::DeadlineExceeded);
        assert!(err.is_cancelled());
        assert!(err.is_timeout());

        let err = Error::Cancelled(CancelReason::Cancelled);
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_configuration_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::config_with("cannot read CA bundle", io);
        assert_eq!(err.to_string(), "configuration error: cannot read CA bundle");
        assert!(err.source().is_some());
        assert_eq!(err.status(), None);
    }
}
