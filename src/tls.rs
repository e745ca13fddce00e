//! TLS Module
//!
//! Builds the rustls server configuration for the RPC listener: the
//! server presents its certificate chain, and client certificates are
//! verified against the trusted CA bundle (mutual TLS). Replication
//! traffic does not pass through here.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};

use crate::config::TlsMaterial;

// == Build Server Config ==
/// Builds the server-side TLS configuration from loaded PEM material.
///
/// Any defect in the material (empty chain, unreadable key, empty CA
/// bundle) is a fatal startup error.
pub fn build_server_config(material: &TlsMaterial) -> Result<ServerConfig> {
    let certs = parse_certs(&material.cert_pem).context("invalid server certificate chain")?;
    if certs.is_empty() {
        bail!("server certificate chain contains no certificates");
    }

    let key = parse_key(&material.key_pem)?;

    let mut roots = RootCertStore::empty();
    for ca in parse_certs(&material.ca_pem).context("invalid CA bundle")? {
        roots
            .add(ca)
            .context("failed to add CA certificate to the trust store")?;
    }
    if roots.is_empty() {
        bail!("CA bundle contains no certificates");
    }

    let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .context("failed to build client certificate verifier")?;

    let config = ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .context("server certificate/key pair rejected")?;

    Ok(config)
}

/// Parses every certificate in a PEM bundle.
fn parse_certs(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    rustls_pemfile::certs(&mut &pem[..])
        .collect::<std::io::Result<Vec<_>>>()
        .context("failed to parse PEM certificates")
}

/// Parses the first private key in PEM material.
fn parse_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut &pem[..])
        .context("failed to parse PEM private key")?
        .ok_or_else(|| anyhow::anyhow!("no private key found in PEM material"))
}
