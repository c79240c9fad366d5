/*
 * uri.rs
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

//! Request URLs: http:// and https:// with a domain, IPv4, or bracketed IPv6 host.
//! Also the percent-encoding set shared by safe cookies and form bodies.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::error::{Error, Result};

/// Component set: encode everything except RFC 3986 unreserved characters.
/// So `;`, `=`, `&`, space, `%` and non-ASCII are always escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a cookie value or form key/value.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Decode a percent-encoded component. `+` is left alone (we never emit it for spaces).
pub fn decode_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn is_secure(&self) -> bool {
        *self == Scheme::Https
    }
}

/// Host part of the URL. IP literals are kept as addresses and never resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Host {
    Domain(String),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

impl Host {
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Host::Domain(_) => None,
            Host::Ipv4(a) => Some(IpAddr::V4(*a)),
            Host::Ipv6(a) => Some(IpAddr::V6(*a)),
        }
    }
}

impl fmt::Display for Host {
    /// IPv6 literals are written bracketed, as they appear in an authority.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Domain(d) => f.write_str(d),
            Host::Ipv4(a) => write!(f, "{}", a),
            Host::Ipv6(a) => write!(f, "[{}]", a),
        }
    }
}

/// Parsed request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: Scheme,
    host: Host,
    port: u16,
    /// Origin-form request target: path plus `?query` if any. Never empty.
    path_and_query: String,
}

impl Target {
    /// Parse an absolute http/https URL. Path defaults to `/`; the fragment is dropped.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", input, e)))?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(Error::InvalidUrl(format!(
                    "unsupported scheme {:?} in {}",
                    other, input
                )))
            }
        };
        let host = match url.host() {
            Some(url::Host::Domain(d)) if !d.is_empty() => Host::Domain(d.to_string()),
            Some(url::Host::Ipv4(a)) => Host::Ipv4(a),
            Some(url::Host::Ipv6(a)) => Host::Ipv6(a),
            _ => return Err(Error::InvalidUrl(format!("no host in {}", input))),
        };
        let port = url.port().unwrap_or_else(|| scheme.default_port());
        let mut path_and_query = url.path().to_string();
        if path_and_query.is_empty() {
            path_and_query.push('/');
        }
        if let Some(q) = url.query() {
            path_and_query.push('?');
            path_and_query.push_str(q);
        }
        Ok(Self {
            scheme,
            host,
            port,
            path_and_query,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Authority for the Host header: bracketed IPv6, port omitted when it is the scheme default.
    pub fn authority(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.to_string()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        write!(f, "{}://{}:{}{}", scheme, self.host, self.port, self.path_and_query)
    }
}
