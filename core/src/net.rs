/*
 * net.rs
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

//! Connector: resolve the target host, open TCP, and for https run the TLS
//! (optionally mutual-TLS) handshake with the client's trust and identity.
//!
//! One connection per request; nothing is pooled and nothing is retried. Failures
//! are classified here so callers can tell resolution, TLS and timeout apart.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::client::ClientConfig as TlsClientConfig;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::RootCertStore;
use tokio_rustls::TlsConnector;

use crate::config::ClientConfig;
use crate::error::{Error, Result, TlsError};
use crate::protocol::http::connection::HttpStream;
use crate::uri::{Host, Target};

/// Platform native certs first, then webpki-roots if the platform store is empty.
fn system_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            let (added, ignored) = root_store.add_parsable_certificates(certs);
            debug!("loaded {} native root certificates ({} ignored)", added, ignored);
        }
        Err(e) => warn!("could not load native root certificates: {}", e),
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

/// Default config: system trust store, no client certificate.
pub fn default_tls_config() -> Arc<TlsClientConfig> {
    let mut tls = TlsClientConfig::builder()
        .with_root_certificates(system_root_store())
        .with_no_client_auth();
    tls.alpn_protocols = vec![b"http/1.1".to_vec()];
    Arc::new(tls)
}

/// Build the rustls client config for a client: trust roots, optional client
/// certificate, ALPN `http/1.1` only.
pub fn tls_client_config(config: &ClientConfig) -> Result<Arc<TlsClientConfig>> {
    let mut roots = if config.uses_system_roots() {
        system_root_store()
    } else {
        RootCertStore::empty()
    };
    if let Some(ca) = &config.server_trust {
        ca.add_to(&mut roots);
    }
    if roots.is_empty() {
        return Err(Error::Config(
            "no trust roots: configure a certificate authority or enable system roots".into(),
        ));
    }
    let builder = TlsClientConfig::builder().with_root_certificates(roots);
    let mut tls = match &config.client_identity {
        Some(identity) => builder
            .with_client_auth_cert(identity.chain(), identity.key())
            .map_err(|e| Error::Config(format!("client identity rejected: {}", e)))?,
        None => builder.with_no_client_auth(),
    };
    tls.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(Arc::new(tls))
}

/// Opens connections for one client. Holds the TLS connector built from its config.
#[derive(Clone)]
pub struct Connector {
    tls: TlsConnector,
    connect_timeout: Duration,
}

impl Connector {
    pub fn new(tls: Arc<TlsClientConfig>, connect_timeout: Duration) -> Self {
        Self {
            tls: TlsConnector::from(tls),
            connect_timeout,
        }
    }

    /// Connect to the target; TLS handshake when the scheme is https. One
    /// `connect_timeout` covers resolution, TCP connect and the handshake together.
    pub async fn connect(&self, target: &Target) -> Result<HttpStream> {
        timeout(self.connect_timeout, self.establish(target))
            .await
            .map_err(|_| {
                if target.scheme().is_secure() {
                    Error::Timeout("connect or TLS handshake timed out")
                } else {
                    Error::Timeout("TCP connect timed out")
                }
            })?
    }

    async fn establish(&self, target: &Target) -> Result<HttpStream> {
        let tcp = open_tcp(target).await?;
        if !target.scheme().is_secure() {
            return Ok(HttpStream::Plain(tcp));
        }

        let server_name = server_name(target.host())?;
        let tls = self.tls.connect(server_name, tcp).await.map_err(|e| {
            let err = TlsError::from_io(e);
            debug!("TLS handshake with {} failed: {} ({})", target.authority(), err, err.kind());
            Error::Tls(err)
        })?;
        debug!(
            "TLS established with {} ({:?})",
            target.authority(),
            tls.get_ref().1.protocol_version()
        );
        Ok(HttpStream::Tls(Box::new(tls)))
    }
}

fn server_name(host: &Host) -> Result<ServerName<'static>> {
    match host {
        Host::Domain(d) => ServerName::try_from(d.clone())
            .map_err(|_| Error::InvalidUrl(format!("invalid host name {}", d))),
        Host::Ipv4(_) | Host::Ipv6(_) => match host.ip() {
            Some(ip) => Ok(ServerName::IpAddress(ip.into())),
            None => Err(Error::InvalidUrl(format!("invalid host {}", host))),
        },
    }
}

/// Resolve and connect. IP literals are used as-is; domain names try each
/// resolved address in order until one accepts.
async fn open_tcp(target: &Target) -> Result<TcpStream> {
    let port = target.port();
    let addrs: Vec<SocketAddr> = match target.host() {
        Host::Domain(d) => tokio::net::lookup_host((d.as_str(), port))
            .await
            .map_err(|e| {
                Error::Resolution(io::Error::new(
                    e.kind(),
                    format!("failed to resolve {}: {}", d, e),
                ))
            })?
            .collect(),
        host => host.ip().map(|ip| SocketAddr::new(ip, port)).into_iter().collect(),
    };
    let mut last_err = None;
    for addr in addrs {
        debug!("connecting to {} ({})", target.authority(), addr);
        match TcpStream::connect(addr).await {
            Ok(tcp) => {
                if let Err(e) = tcp.set_nodelay(true) {
                    debug!("could not set TCP_NODELAY on {}: {}", addr, e);
                }
                return Ok(tcp);
            }
            Err(e) => {
                debug!("connect to {} failed: {}", addr, e);
                last_err = Some(io::Error::new(e.kind(), format!("{}: {}", addr, e)));
            }
        }
    }
    Err(Error::Resolution(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses for {}", target.host()),
        )
    })))
}
