//! Loading trusted root certificates.

use std::path::Path;
use tracing::debug;

use crate::{HttpClientError, Result};

/// Trust only the certificates in the PEM bundle at `path`.
///
/// Every certificate in the bundle is added as a root and the built-in
/// roots are disabled.
pub fn configure_tls(
    builder: reqwest::ClientBuilder,
    path: impl AsRef<Path>,
) -> Result<reqwest::ClientBuilder> {
    let path = path.as_ref();
    let pem = std::fs::read(path)?;
    let certs = load_pem_bundle(&pem)?;
    debug!(path = %path.display(), certificates = certs.len(), "Loaded root certificates");

    let builder = certs
        .into_iter()
        .fold(builder, |builder, cert| builder.add_root_certificate(cert));

    Ok(builder.tls_built_in_root_certs(false))
}

fn load_pem_bundle(pem: &[u8]) -> Result<Vec<reqwest::Certificate>> {
    let certs = reqwest::Certificate::from_pem_bundle(pem)
        .map_err(|e| HttpClientError::Tls(e.to_string()))?;
    if certs.is_empty() {
        return Err(HttpClientError::Tls(
            "no certificates found in PEM bundle".to_string(),
        ));
    }
    Ok(certs)
}
