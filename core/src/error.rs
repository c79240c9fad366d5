/*
 * error.rs
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

//! Client errors. Every failure surfaces as one `Error`, displayed as `"<Category>: <detail>"`.

use std::fmt;
use std::io;

use tokio_rustls::rustls;
use tokio_rustls::rustls::{AlertDescription, CertificateError};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from building, sending, or reading an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header name or value rejected before anything was sent.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Request body could not be serialized.
    #[error("Encode error: {0}")]
    Encode(String),

    /// PEM or base64 material did not contain a usable certificate or key.
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Client builder validation failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host could not be resolved or the TCP connection was refused.
    #[error("Connection error: {0}")]
    Resolution(#[source] io::Error),

    /// TLS handshake failed.
    #[error("Connection error: {0}")]
    Tls(#[source] TlsError),

    /// Peer sent something that is not valid HTTP/1.x.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Response body was not valid UTF-8 or JSON.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Connect, handshake, write, or read exceeded its deadline.
    #[error("Timeout: {0}")]
    Timeout(&'static str),

    /// Transport failure on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// The TLS failure, if this error came from the handshake.
    pub fn tls(&self) -> Option<&TlsError> {
        match self {
            Error::Tls(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

/// Reason a TLS handshake was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsErrorKind {
    /// Peer chain does not lead to a configured trust root.
    UnknownIssuer,
    Expired,
    NotValidYet,
    /// Certificate is not valid for the host we dialed.
    NotValidForName,
    BadSignature,
    Revoked,
    /// Peer aborted the handshake with an alert (e.g. it refused our client certificate).
    PeerRejected,
    Other,
}

impl TlsErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsErrorKind::UnknownIssuer => "UnknownIssuer",
            TlsErrorKind::Expired => "Expired",
            TlsErrorKind::NotValidYet => "NotValidYet",
            TlsErrorKind::NotValidForName => "NotValidForName",
            TlsErrorKind::BadSignature => "BadSignature",
            TlsErrorKind::Revoked => "Revoked",
            TlsErrorKind::PeerRejected => "PeerRejected",
            TlsErrorKind::Other => "Other",
        }
    }
}

impl fmt::Display for TlsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TLS handshake failure. Display is the underlying rustls message, unchanged,
/// e.g. `invalid peer certificate: UnknownIssuer`.
#[derive(Debug)]
pub struct TlsError {
    kind: TlsErrorKind,
    message: String,
    rustls: Option<rustls::Error>,
}

impl TlsError {
    pub fn kind(&self) -> TlsErrorKind {
        self.kind
    }

    /// The rustls error behind this failure, when the handshake got far enough to produce one.
    pub fn rustls_error(&self) -> Option<&rustls::Error> {
        self.rustls.as_ref()
    }

    pub(crate) fn from_rustls(err: rustls::Error) -> Self {
        let kind = match &err {
            rustls::Error::InvalidCertificate(cert) => match cert {
                CertificateError::UnknownIssuer => TlsErrorKind::UnknownIssuer,
                CertificateError::Expired => TlsErrorKind::Expired,
                CertificateError::NotValidYet => TlsErrorKind::NotValidYet,
                CertificateError::NotValidForName => TlsErrorKind::NotValidForName,
                CertificateError::BadSignature => TlsErrorKind::BadSignature,
                CertificateError::Revoked => TlsErrorKind::Revoked,
                _ => TlsErrorKind::Other,
            },
            rustls::Error::AlertReceived(alert) => match alert {
                AlertDescription::UnknownCA
                | AlertDescription::BadCertificate
                | AlertDescription::CertificateRequired
                | AlertDescription::CertificateUnknown
                | AlertDescription::HandshakeFailure
                | AlertDescription::AccessDenied => TlsErrorKind::PeerRejected,
                _ => TlsErrorKind::Other,
            },
            _ => TlsErrorKind::Other,
        };
        Self {
            kind,
            message: err.to_string(),
            rustls: Some(err),
        }
    }

    /// Classify a handshake failure reported by tokio-rustls. rustls errors are
    /// carried inside the io::Error; anything else (reset, EOF) is `Other`.
    pub(crate) fn from_io(err: io::Error) -> Self {
        let inner = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
            .cloned();
        match inner {
            Some(e) => Self::from_rustls(e),
            None => Self {
                kind: TlsErrorKind::Other,
                message: format!("TLS handshake failed: {}", err),
                rustls: None,
            },
        }
    }
}

impl fmt::Display for TlsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TlsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.rustls
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
