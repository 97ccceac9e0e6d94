use reqwest::{Certificate, Identity};
use std::path::Path;

use crate::error::{Error, Result};

/// Loads every certificate from a PEM bundle at `path`.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the file cannot be read, a
/// certificate does not parse, or the file holds no certificate at all.
pub fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let pem = std::fs::read(path).map_err(|e| {
        Error::config_with(format!("cannot read CA bundle '{}'", path.display()), e)
    })?;

    let certs = Certificate::from_pem_bundle(&pem).map_err(|e| {
        Error::config_with(format!("malformed certificate in '{}'", path.display()), e)
    })?;

    if certs.is_empty() {
        return Err(Error::config(format!(
            "no certificates found in CA bundle '{}'",
            path.display()
        )));
    }
    Ok(certs)
}

/// Loads a client identity from a PEM certificate chain and a PKCS#8 PEM key.
pub fn load_identity(cert_path: &Path, key_path: &Path) -> Result<Identity> {
    let read = |path: &Path| {
        std::fs::read(path).map_err(|e| {
            Error::config_with(format!("cannot read '{}'", path.display()), e)
        })
    };
    let cert = read(cert_path)?;
    let key = read(key_path)?;

    Identity::from_pkcs8_pem(&cert, &key)
        .map_err(|e| Error::config_with("invalid client certificate or key", e))
}
