/*
 * config.rs
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

//! Client configuration: deadlines and TLS material. Assembled field by field by
//! `HttpClientBuilder` and frozen into the client at `build()`.

use std::time::Duration;

use crate::identity::{CertificateAuthority, ClientIdentity};

/// TCP connect (including DNS) and TLS handshake deadline.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline for each individual read or write on an established connection.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every request sent from one client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Extra trust root for server certificates.
    pub server_trust: Option<CertificateAuthority>,
    /// Certificate presented when the server asks for one.
    pub client_identity: Option<ClientIdentity>,
    /// Whether the platform trust store is consulted. `None` means: only when no
    /// `server_trust` is configured.
    pub use_system_roots: Option<bool>,
}

impl ClientConfig {
    pub fn uses_system_roots(&self) -> bool {
        self.use_system_roots
            .unwrap_or(self.server_trust.is_none())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            server_trust: None,
            client_identity: None,
            use_system_roots: None,
        }
    }
}
