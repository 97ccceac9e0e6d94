//! TLS client provisioning.
//!
//! [`CertConfig`] names the trust bundle and optional client identity.
//! [`build_client_pair`] turns it into a [`ClientPair`]: a secure client that
//! trusts the bundle and presents the identity, and an insecure one that does
//! neither.

mod bundle;

pub use bundle::{load_ca_bundle, load_identity};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::{Error, Result};
use crate::transport::{HttpClient, RetryClient, RetryClientBuilder};

/// Where to find TLS material. Every field is optional; an empty config
/// produces clients that use the system trust store.
#[derive(Debug, Clone, Default)]
pub struct CertConfig {
    pub ca_bundle_path: Option<PathBuf>,
    pub client_cert_path: Option<PathBuf>,
    pub client_key_path: Option<PathBuf>,
    /// Request timeout baked into both clients.
    pub timeout: Option<Duration>,
}

impl CertConfig {
    /// Config trusting the bundle at `path`. An empty path means the system
    /// trust store.
    pub fn with_ca_bundle(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            ca_bundle_path: (!path.as_os_str().is_empty()).then(|| path.to_path_buf()),
            ..Self::default()
        }
    }

    pub fn client_identity(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.client_cert_path = Some(cert.into());
        self.client_key_path = Some(key.into());
        self
    }
}

/// Two alternative transport handles attached to a request.
///
/// Either side may be cleared by the caller; see
/// [`HttpRequest::resolve_client`](crate::HttpRequest::resolve_client).
#[derive(Clone, Default)]
pub struct ClientPair {
    pub secure: Option<Arc<dyn HttpClient>>,
    pub insecure: Option<Arc<dyn HttpClient>>,
}

impl fmt::Debug for ClientPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientPair")
            .field("secure", &self.secure.is_some())
            .field("insecure", &self.insecure.is_some())
            .finish()
    }
}

/// Builds a [`ClientPair`] from `config` with default retry settings.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the bundle or identity cannot be
/// loaded, or if only one half of the identity is configured.
pub fn build_client_pair(config: &CertConfig) -> Result<ClientPair> {
    build_client_pair_with(config, RetryClient::builder())
}

/// Builds a [`ClientPair`] where both clients start from `base`, so retry
/// limits and the user agent match a plain client built from the same
/// settings. `config.timeout`, when set, overrides the base timeout.
pub fn build_client_pair_with(config: &CertConfig, base: RetryClientBuilder) -> Result<ClientPair> {
    let mut secure = base.clone();
    let mut insecure = base;

    if let Some(timeout) = config.timeout {
        secure = secure.timeout(timeout);
        insecure = insecure.timeout(timeout);
    }

    let mut trusted = 0;
    if let Some(path) = &config.ca_bundle_path {
        for cert in load_ca_bundle(path)? {
            secure = secure.add_root_certificate(cert);
            trusted += 1;
        }
    }

    let with_identity = match (&config.client_cert_path, &config.client_key_path) {
        (Some(cert), Some(key)) => {
            secure = secure.identity(load_identity(cert, key)?);
            true
        }
        (None, None) => false,
        _ => {
            return Err(Error::config(
                "client certificate and key must be configured together",
            ));
        }
    };

    info!(
        ca_bundle = ?config.ca_bundle_path,
        trusted,
        with_identity,
        "Built TLS client pair"
    );

    Ok(ClientPair {
        secure: Some(Arc::new(secure.build()?)),
        insecure: Some(Arc::new(insecure.build()?)),
    })
}
