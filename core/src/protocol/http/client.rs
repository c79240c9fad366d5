/*
 * client.rs
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

//! HTTP client: holds TLS configuration and deadlines; each verb returns a
//! `RequestBuilder`, and `send()` connects, writes the request and reads the head.
//!
//! Clients are immutable and cheap to clone; concurrent sends share nothing but
//! the read-only configuration, and each opens its own connection.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::identity::{CertificateAuthority, ClientIdentity};
use crate::net::{default_tls_config, tls_client_config, Connector};
use crate::protocol::http::connection::HttpConnection;
use crate::protocol::http::request::{Method, Request, RequestBuilder};
use crate::protocol::http::response::Response;

struct ClientInner {
    config: ClientConfig,
    connector: Connector,
}

/// HTTP/1.1 client. `HttpClient::new()` trusts the system roots; use
/// `HttpClient::builder()` for a custom CA or a client certificate.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl HttpClient {
    /// Client with the platform trust store and default deadlines.
    pub fn new() -> Self {
        let config = ClientConfig::default();
        let connector = Connector::new(default_tls_config(), config.connect_timeout);
        Self {
            inner: Arc::new(ClientInner { config, connector }),
        }
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, url)
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::Get, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::Post, url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::Put, url)
    }

    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(Method::Patch, url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(Method::Delete, url)
    }

    /// One connection, one request. No retries: every failure goes straight back.
    pub(crate) async fn execute(&self, request: Request) -> Result<Response> {
        let target = request.target();
        debug!("{} {}", request.method().as_str(), target);
        let stream = self.inner.connector.connect(target).await?;
        let mut conn = HttpConnection::new(stream, self.inner.config.read_timeout);
        conn.write_request(&request).await?;
        let head = conn.read_head().await?;
        Ok(Response::new(head, conn))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Assembles a `ClientConfig`; validated and frozen by `build()`.
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    config: ClientConfig,
}

impl HttpClientBuilder {
    /// Trust this CA for server certificates. Replaces the system roots unless
    /// `with_system_roots(true)` is also set.
    pub fn with_server_authentication(mut self, ca: CertificateAuthority) -> Self {
        self.config.server_trust = Some(ca);
        self
    }

    /// Present this certificate when the server requests client authentication.
    pub fn with_client_authentication(mut self, identity: ClientIdentity) -> Self {
        self.config.client_identity = Some(identity);
        self
    }

    pub fn with_system_roots(mut self, enabled: bool) -> Self {
        self.config.use_system_roots = Some(enabled);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let config = self.config;
        if config.connect_timeout.is_zero() || config.read_timeout.is_zero() {
            return Err(Error::Config("timeouts must be greater than zero".into()));
        }
        let connector = Connector::new(tls_client_config(&config)?, config.connect_timeout);
        Ok(HttpClient {
            inner: Arc::new(ClientInner { config, connector }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca() -> CertificateAuthority {
        CertificateAuthority::from_pem(include_str!("../../../tests/data/ca-crt.pem")).unwrap()
    }

    #[test]
    fn builder_assembles_config() {
        let client = HttpClient::builder()
            .with_server_authentication(ca())
            .read_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert!(client.config().server_trust.is_some());
        assert!(!client.config().uses_system_roots());
        assert_eq!(client.config().read_timeout, Duration::from_secs(5));
        assert_eq!(client.config().connect_timeout, crate::config::DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = HttpClient::builder()
            .connect_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn no_roots_is_rejected() {
        assert!(HttpClient::builder().with_system_roots(false).build().is_err());
    }

    #[test]
    fn clients_are_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<HttpClient>();
        assert_send_sync::<CertificateAuthority>();
        assert_send_sync::<ClientIdentity>();
    }
}
