/*
 * lib.rs
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

//! Silq: an HTTP/1.1 client with mutual TLS, fluent request building and
//! frame-by-frame response streaming.
//!
//! ```rust,no_run
//! use silq_core::{CertificateAuthority, ClientIdentity, HttpClient};
//!
//! # async fn example(ca: &str, cert: &str, key: &str) -> silq_core::Result<()> {
//! let client = HttpClient::builder()
//!     .with_server_authentication(CertificateAuthority::from_pem(ca)?)
//!     .with_client_authentication(ClientIdentity::from_pem(cert, key)?)
//!     .build()?;
//!
//! let mut response = client
//!     .post("https://localhost:8443/items")
//!     .with_json(&serde_json::json!({"name": "widget"}))
//!     .send()
//!     .await?;
//! assert_eq!(response.status_code(), 200);
//!
//! let mut frames = response.iter_frames();
//! while let Some(frame) = frames.next().await? {
//!     println!("{} bytes", frame.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod net;
pub mod protocol;
pub mod uri;

pub use config::ClientConfig;
pub use error::{Error, Result, TlsError, TlsErrorKind};
pub use identity::{CertificateAuthority, ClientIdentity};
pub use protocol::http::{
    Body, Frames, HeaderMap, HttpClient, HttpClientBuilder, Method, Request, RequestBuilder,
    Response,
};
pub use uri::Target;
