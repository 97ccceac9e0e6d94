use std::sync::Arc;

use super::HttpRequest;
use crate::transport::HttpClient;

/// Which transport handle a call will use, in precedence order.
pub enum ClientChoice<'a> {
    /// The TLS pair's secure client.
    Secure(&'a Arc<dyn HttpClient>),
    /// The TLS pair's insecure client, used because the secure one is cleared.
    InsecureFallback(&'a Arc<dyn HttpClient>),
    /// The plain client set on the request.
    Explicit(&'a Arc<dyn HttpClient>),
    /// Nothing attached; a default retrying client is built for the call.
    Default,
    /// A TLS pair is attached but both of its handles are cleared.
    Unresolved,
}

impl ClientChoice<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientChoice::Secure(_) => "secure",
            ClientChoice::InsecureFallback(_) => "insecure-fallback",
            ClientChoice::Explicit(_) => "explicit",
            ClientChoice::Default => "default",
            ClientChoice::Unresolved => "unresolved",
        }
    }
}

impl HttpRequest {
    /// Picks the transport handle for the next call.
    ///
    /// A TLS pair wins over a plain client, even when the pair can only
    /// offer its insecure side.
    pub fn resolve_client(&self) -> ClientChoice<'_> {
        match (&self.tls_client_pair, &self.client) {
            (Some(pair), _) => match (&pair.secure, &pair.insecure) {
                (Some(secure), _) => ClientChoice::Secure(secure),
                (None, Some(insecure)) => ClientChoice::InsecureFallback(insecure),
                (None, None) => ClientChoice::Unresolved,
            },
            (None, Some(client)) => ClientChoice::Explicit(client),
            (None, None) => ClientChoice::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::ClientPair;
    use crate::error::Result;
    use crate::transport::RetryOverride;
    use async_trait::async_trait;

    struct Unused;

    #[async_trait]
    impl HttpClient for Unused {
        async fn execute(
            &self,
            _req: reqwest::Request,
            _retry: RetryOverride,
        ) -> Result<reqwest::Response> {
            unreachable!("resolver tests never execute")
        }
    }

    fn handle() -> Arc<dyn HttpClient> {
        Arc::new(Unused)
    }

    fn resolved<'a>(choice: ClientChoice<'a>) -> Option<&'a Arc<dyn HttpClient>> {
        match choice {
            ClientChoice::Secure(c) | ClientChoice::InsecureFallback(c) | ClientChoice::Explicit(c) => {
                Some(c)
            }
            ClientChoice::Default | ClientChoice::Unresolved => None,
        }
    }

    #[test]
    fn test_nothing_attached_uses_default() {
        let req = HttpRequest::new("http://localhost");
        assert_eq!(req.resolve_client().kind(), "default");
    }

    #[test]
    fn test_explicit_client() {
        let client = handle();
        let mut req = HttpRequest::new("http://localhost");
        req.client = Some(client.clone());

        let choice = req.resolve_client();
        assert_eq!(choice.kind(), "explicit");
        assert!(Arc::ptr_eq(resolved(choice).unwrap(), &client));
    }

    #[test]
    fn test_pair_beats_explicit_client() {
        let secure = handle();
        let mut req = HttpRequest::new("http://localhost");
        req.client = Some(handle());
        req.tls_client_pair = Some(ClientPair {
            secure: Some(secure.clone()),
            insecure: Some(handle()),
        });

        let choice = req.resolve_client();
        assert_eq!(choice.kind(), "secure");
        assert!(Arc::ptr_eq(resolved(choice).unwrap(), &secure));
    }

    #[test]
    fn test_cleared_secure_falls_back_to_insecure() {
        let insecure = handle();
        let mut req = HttpRequest::new("http://localhost");
        req.tls_client_pair = Some(ClientPair {
            secure: None,
            insecure: Some(insecure.clone()),
        });

        let choice = req.resolve_client();
        assert_eq!(choice.kind(), "insecure-fallback");
        assert!(Arc::ptr_eq(resolved(choice).unwrap(), &insecure));
    }

    #[test]
    fn test_empty_pair_is_unresolved_even_with_client() {
        let mut req = HttpRequest::new("http://localhost");
        req.client = Some(handle());
        req.tls_client_pair = Some(ClientPair::default());
        assert_eq!(req.resolve_client().kind(), "unresolved");
    }
}
