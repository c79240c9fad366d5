/*
 * identity.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Silq, an HTTP client library.
 *
 * Silq is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Silq is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Silq.  If not, see <http://www.gnu.org/licenses/>.
 */

//! TLS material: trust roots (`CertificateAuthority`) and client certificates (`ClientIdentity`).
//!
//! Both are parsed once from PEM (or base64 of PEM) and are cheap to clone; the DER
//! is shared behind an `Arc` so one identity can back any number of clients.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tokio_rustls::rustls::pki_types::pem::PemObject;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::RootCertStore;

use crate::error::{Error, Result};

/// Decode base64-wrapped PEM text. Whitespace (line wrapping) is ignored.
fn decode_base64_pem(input: &str, what: &str) -> Result<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| Error::Certificate(format!("{} is not valid base64: {}", what, e)))
}

fn parse_certificates(pem: &[u8], what: &str) -> Result<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_slice_iter(pem)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Certificate(format!("{}: {}", what, e)))?;
    if certs.is_empty() {
        return Err(Error::Certificate(format!("no certificate found in {}", what)));
    }
    Ok(certs)
}

/// Trust root for validating the server's certificate chain.
#[derive(Clone)]
pub struct CertificateAuthority {
    certs: Arc<Vec<CertificateDer<'static>>>,
}

impl CertificateAuthority {
    /// Parse one or more PEM certificates. Every certificate must be a usable trust anchor.
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let certs = parse_certificates(pem.as_ref(), "CA PEM")?;
        let mut store = RootCertStore::empty();
        for cert in &certs {
            store
                .add(cert.clone())
                .map_err(|e| Error::Certificate(format!("unusable CA certificate: {}", e)))?;
        }
        Ok(Self {
            certs: Arc::new(certs),
        })
    }

    /// Same as `from_pem`, with the PEM text itself base64-encoded.
    pub fn from_base64_pem(base64_pem: &str) -> Result<Self> {
        let pem = decode_base64_pem(base64_pem, "CA")?;
        Self::from_pem(pem)
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Add these roots to a rustls store. Returns the number added.
    pub(crate) fn add_to(&self, store: &mut RootCertStore) -> usize {
        let (added, _) = store.add_parsable_certificates(self.certs.iter().cloned());
        added
    }
}

impl fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("certificates", &self.certs.len())
            .finish()
    }
}

/// Client certificate chain and private key presented during a mutual-TLS handshake.
#[derive(Clone)]
pub struct ClientIdentity {
    chain: Arc<Vec<CertificateDer<'static>>>,
    key: Arc<PrivateKeyDer<'static>>,
}

impl ClientIdentity {
    /// Certificate chain (leaf first) and private key, both PEM.
    /// The key may be PKCS#8, PKCS#1 (RSA) or SEC1 (EC).
    pub fn from_pem(cert_pem: impl AsRef<[u8]>, key_pem: impl AsRef<[u8]>) -> Result<Self> {
        let chain = parse_certificates(cert_pem.as_ref(), "client certificate PEM")?;
        let key = PrivateKeyDer::from_pem_slice(key_pem.as_ref())
            .map_err(|e| Error::Certificate(format!("client key PEM: {}", e)))?;
        Ok(Self {
            chain: Arc::new(chain),
            key: Arc::new(key),
        })
    }

    /// Same as `from_pem`, with each PEM text base64-encoded.
    pub fn from_base64_pem(base64_cert: &str, base64_key: &str) -> Result<Self> {
        let cert = decode_base64_pem(base64_cert, "client certificate")?;
        let key = decode_base64_pem(base64_key, "client key")?;
        Self::from_pem(cert, key)
    }

    pub(crate) fn chain(&self) -> Vec<CertificateDer<'static>> {
        self.chain.as_ref().clone()
    }

    pub(crate) fn key(&self) -> PrivateKeyDer<'static> {
        self.key.clone_key()
    }
}

impl fmt::Debug for ClientIdentity {
    /// Never prints key material.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("chain", &self.chain.len())
            .finish_non_exhaustive()
    }
}
