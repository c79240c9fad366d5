/*
 * writer.rs
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

//! HTTP/1.1 request serialization.
//!
//! Layout: request line, Host (unless the caller set one), caller headers in
//! insertion order, Content-Length (unless the caller set it or asked for
//! chunked), blank line, body. Nothing else is added.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::protocol::http::request::Request;

/// Serialize the whole request (head and body) into one buffer.
pub fn encode_request(request: &Request) -> Result<BytesMut> {
    let body = request.body().encode()?;
    let headers = request.headers();
    let chunked = headers
        .get_all("transfer-encoding")
        .iter()
        .any(|v| v.to_ascii_lowercase().contains("chunked"));

    let mut out = BytesMut::with_capacity(256 + body.as_ref().map_or(0, Bytes::len));
    out.put_slice(request.method().as_str().as_bytes());
    out.put_u8(b' ');
    out.put_slice(request.target().path_and_query().as_bytes());
    out.put_slice(b" HTTP/1.1\r\n");

    if !headers.contains("host") {
        put_header(&mut out, "Host", &request.target().authority());
    }
    for (name, value) in headers.iter() {
        put_header(&mut out, name, value);
    }
    if !chunked && !headers.contains("content-length") {
        match &body {
            Some(b) => put_header(&mut out, "Content-Length", &b.len().to_string()),
            None if request.method().expects_body() => put_header(&mut out, "Content-Length", "0"),
            None => {}
        }
    }
    out.put_slice(b"\r\n");

    match body {
        Some(b) if chunked => {
            if !b.is_empty() {
                out.put_slice(format!("{:x}\r\n", b.len()).as_bytes());
                out.put_slice(&b);
                out.put_slice(b"\r\n");
            }
            out.put_slice(b"0\r\n\r\n");
        }
        Some(b) => out.put_slice(&b),
        None if chunked => out.put_slice(b"0\r\n\r\n"),
        None => {}
    }
    Ok(out)
}

fn put_header(out: &mut BytesMut, name: &str, value: &str) {
    out.put_slice(name.as_bytes());
    out.put_slice(b": ");
    out.put_slice(value.as_bytes());
    out.put_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::http::HttpClient;
    use serde_json::json;

    fn encode(builder: crate::protocol::http::RequestBuilder) -> String {
        let request = builder.build().unwrap();
        String::from_utf8(encode_request(&request).unwrap().to_vec()).unwrap()
    }

    #[test]
    fn get_has_host_and_no_length() {
        let client = HttpClient::new();
        let wire = encode(client.get("http://localhost:8080/p?q=1"));
        assert_eq!(wire, "GET /p?q=1 HTTP/1.1\r\nHost: localhost:8080\r\n\r\n");
    }

    #[test]
    fn host_brackets_ipv6_and_omits_default_port() {
        let client = HttpClient::new();
        assert!(encode(client.get("https://[::1]:8443/")).contains("\r\nHost: [::1]:8443\r\n"));
        assert!(encode(client.get("https://[::1]/")).contains("\r\nHost: [::1]\r\n"));
        assert!(encode(client.delete("http://example.com:80/x")).contains("\r\nHost: example.com\r\n"));
    }

    #[test]
    fn headers_in_insertion_order_then_length_then_body() {
        let client = HttpClient::new();
        let wire = encode(
            client
                .post("http://h/")
                .header("X-First", "1")
                .add_header("X-Second", "2")
                .with_body("line1\nline2\n"),
        );
        assert_eq!(
            wire,
            "POST / HTTP/1.1\r\nHost: h\r\nX-First: 1\r\nX-Second: 2\r\nContent-Length: 12\r\n\r\nline1\nline2\n"
        );
    }

    #[test]
    fn empty_post_sends_zero_length() {
        let wire = encode(HttpClient::new().post("http://h/"));
        assert!(wire.ends_with("Content-Length: 0\r\n\r\n"));
    }

    #[test]
    fn caller_host_and_length_take_precedence() {
        let wire = encode(
            HttpClient::new()
                .put("http://h/")
                .header("Host", "other")
                .header("Content-Length", "2")
                .with_body("ok"),
        );
        assert_eq!(wire.matches("Host:").count(), 1);
        assert!(wire.contains("Host: other\r\n"));
        assert_eq!(wire.matches("Content-Length").count(), 1);
    }

    #[test]
    fn caller_chunked_encoding_frames_body() {
        let wire = encode(
            HttpClient::new()
                .patch("http://h/")
                .header("Transfer-Encoding", "chunked")
                .with_json(&json!({"a": 1})),
        );
        assert!(!wire.contains("Content-Length"));
        assert!(wire.ends_with("\r\n\r\n7\r\n{\"a\":1}\r\n0\r\n\r\n"));
    }
}
