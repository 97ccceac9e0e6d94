use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// HTTP Basic credentials sent as `Authorization: Basic base64(user:pass)`.
///
/// The password is held as a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct Auth {
    pub username: String,
    pub password: SecretString,
}

impl Auth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Writes the `Authorization` header into `headers`, replacing any
    /// value a custom header may have set.
    pub(crate) fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        let credentials = format!("{}:{}", self.username, self.password.expose_secret());
        let encoded = STANDARD.encode(credentials.as_bytes());

        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| Error::Validation("basic auth credentials are not a valid header".into()))?;
        value.set_sensitive(true);

        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}
