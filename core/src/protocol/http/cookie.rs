/*
 * cookie.rs
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

//! Safe cookies: each value percent-encoded on its own, pairs joined with `"; "`,
//! sent as one `Cookie` header. Values may contain `;`, `=` or spaces.

use crate::error::{Error, Result};
use crate::uri::{decode_component, encode_component};

/// Encode name/value pairs into a single Cookie header value.
/// Names must be cookie tokens; values are escaped.
pub fn encode_safe_cookies<I, K, V>(cookies: I) -> Result<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (name, value) in cookies {
        let name = name.as_ref();
        if name.is_empty()
            || name
                .bytes()
                .any(|b| b <= b' ' || b >= 0x7f || b"()<>@,;:\\\"/[]?={}".contains(&b))
        {
            return Err(Error::InvalidHeader(format!("invalid cookie name {:?}", name)));
        }
        if !out.is_empty() {
            out.push_str("; ");
        }
        out.push_str(name);
        out.push('=');
        out.push_str(&encode_component(value.as_ref()));
    }
    Ok(out)
}

/// Inverse of `encode_safe_cookies`: split on `"; "`, then on the first `=`, decode the value.
pub fn decode_safe_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split("; ")
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), decode_component(value)),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
