/*
 * request.rs
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

//! HTTP request: method, target URL, headers, optional body.
//!
//! Built fluently via `RequestBuilder` (obtained from `HttpClient::get` etc.); the
//! first failure in the chain is kept and returned by `send()`, so building never panics.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::protocol::http::client::HttpClient;
use crate::protocol::http::cookie::encode_safe_cookies;
use crate::protocol::http::form;
use crate::protocol::http::headers::{self, HeaderMap};
use crate::protocol::http::response::Response;
use crate::uri::Target;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Methods whose requests carry a payload; these always send Content-Length.
    pub fn expects_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

/// Request payload. At most one kind is set; the last `with_*` call wins.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Raw(Bytes),
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

impl Body {
    /// Wire bytes of the body, `None` when there is no body.
    pub fn encode(&self) -> Result<Option<Bytes>> {
        match self {
            Body::Empty => Ok(None),
            Body::Raw(b) => Ok(Some(b.clone())),
            Body::Json(v) => serde_json::to_vec(v)
                .map(|v| Some(Bytes::from(v)))
                .map_err(|e| Error::Encode(e.to_string())),
            Body::Form(pairs) => Ok(Some(Bytes::from(form::encode_pairs(pairs)))),
        }
    }
}

/// A complete request, frozen once handed to `send()`.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    target: Target,
    headers: HeaderMap,
    body: Body,
    /// Content-Type was set by `with_json`/`with_form`, not by the caller.
    implicit_content_type: bool,
}

impl Request {
    pub fn new(method: Method, target: Target) -> Self {
        Self {
            method,
            target,
            headers: HeaderMap::new(),
            body: Body::Empty,
            implicit_content_type: false,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        headers::validate(name, value)?;
        if name.eq_ignore_ascii_case("content-type") {
            self.implicit_content_type = false;
        }
        self.headers.set(name, value);
        Ok(())
    }

    fn add_header(&mut self, name: &str, value: &str) -> Result<()> {
        headers::validate(name, value)?;
        if name.eq_ignore_ascii_case("content-type") {
            self.implicit_content_type = false;
        }
        self.headers.add(name, value);
        Ok(())
    }

    fn set_body(&mut self, body: Body, content_type: Option<&str>) {
        if self.implicit_content_type {
            self.headers.remove("content-type");
            self.implicit_content_type = false;
        }
        if let Some(ct) = content_type {
            self.headers.set("Content-Type", ct);
            self.implicit_content_type = true;
        }
        self.body = body;
    }
}

/// Fluent request builder. Each call consumes and returns the builder; on
/// conflicting header names the later call wins.
#[must_use = "a request does nothing until it is sent"]
pub struct RequestBuilder {
    client: HttpClient,
    request: Result<Request>,
}

impl RequestBuilder {
    pub(crate) fn new(client: HttpClient, method: Method, url: &str) -> Self {
        Self {
            client,
            request: Target::parse(url).map(|target| Request::new(method, target)),
        }
    }

    fn apply(mut self, f: impl FnOnce(&mut Request) -> Result<()>) -> Self {
        if let Ok(request) = &mut self.request {
            if let Err(e) = f(request) {
                self.request = Err(e);
            }
        }
        self
    }

    /// Set each header, replacing earlier values of the same name.
    pub fn with_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply(|r| {
            for (name, value) in headers {
                r.set_header(name.as_ref(), value.as_ref())?;
            }
            Ok(())
        })
    }

    /// Set one header, replacing earlier values of the same name.
    pub fn header(self, name: &str, value: &str) -> Self {
        self.apply(|r| r.set_header(name, value))
    }

    /// Append a header value, keeping earlier values of the same name.
    pub fn add_header(self, name: &str, value: &str) -> Self {
        self.apply(|r| r.add_header(name, value))
    }

    /// Send cookies with each value percent-encoded; replaces any Cookie header.
    pub fn with_safe_cookies<I, K, V>(self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply(|r| {
            let cookie = encode_safe_cookies(cookies)?;
            if !cookie.is_empty() {
                r.set_header("Cookie", &cookie)?;
            }
            Ok(())
        })
    }

    /// Raw body, sent byte for byte. No Content-Type is added.
    pub fn with_body(self, body: impl AsRef<[u8]>) -> Self {
        let body = Bytes::copy_from_slice(body.as_ref());
        self.apply(|r| {
            r.set_body(Body::Raw(body), None);
            Ok(())
        })
    }

    /// JSON body; sets `Content-Type: application/json`.
    pub fn with_json<T: Serialize + ?Sized>(self, json: &T) -> Self {
        self.apply(|r| {
            let value = serde_json::to_value(json).map_err(|e| Error::Encode(e.to_string()))?;
            r.set_body(Body::Json(value), Some(JSON_CONTENT_TYPE));
            Ok(())
        })
    }

    /// Form body; sets `Content-Type: application/x-www-form-urlencoded`.
    pub fn with_form<T: Serialize + ?Sized>(self, form: &T) -> Self {
        self.apply(|r| {
            let pairs = form::to_pairs(form)?;
            r.set_body(Body::Form(pairs), Some(form::CONTENT_TYPE));
            Ok(())
        })
    }

    /// `Authorization: Basic base64(user:pass)`.
    pub fn with_basic_auth(self, user: &str, password: &str) -> Self {
        self.apply(|r| {
            if user.contains(':') {
                return Err(Error::InvalidHeader(
                    "basic auth user name must not contain ':'".into(),
                ));
            }
            let credentials = BASE64.encode(format!("{}:{}", user, password));
            r.set_header("Authorization", &format!("Basic {}", credentials))
        })
    }

    /// `Authorization: Bearer <token>`.
    pub fn with_bearer_auth(self, token: &str) -> Self {
        self.apply(|r| r.set_header("Authorization", &format!("Bearer {}", token)))
    }

    /// Finish building without sending.
    pub fn build(self) -> Result<Request> {
        self.request
    }

    /// Connect, write the request and read the response head. The body is read lazily
    /// from the returned `Response`.
    pub async fn send(self) -> Result<Response> {
        let request = self.request?;
        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(url: &str) -> RequestBuilder {
        HttpClient::new().get(url)
    }

    #[test]
    fn method_names() {
        assert_eq!(Method::Patch.as_str(), "PATCH");
        assert!(Method::Put.expects_body());
        assert!(!Method::Delete.expects_body());
    }

    #[test]
    fn later_headers_win() {
        let req = get("http://localhost:8080")
            .with_headers([("x-a", "1"), ("x-b", "2")])
            .with_headers([("X-A", "3")])
            .build()
            .unwrap();
        assert_eq!(req.headers().get_all("x-a"), vec!["3"]);
        assert_eq!(req.headers().get_first("x-b"), Some("2"));
    }

    #[test]
    fn add_header_keeps_duplicates() {
        let req = get("http://localhost/")
            .add_header("Accept", "text/html")
            .add_header("accept", "application/json")
            .build()
            .unwrap();
        assert_eq!(req.headers().get_all("ACCEPT").len(), 2);
    }

    #[test]
    fn json_sets_content_type_and_body() {
        let req = get("http://localhost/")
            .with_json(&json!({"a": [1, null]}))
            .build()
            .unwrap();
        assert_eq!(req.headers().get_first("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(req.body().encode().unwrap().unwrap(), Bytes::from_static(br#"{"a":[1,null]}"#));
    }

    #[test]
    fn raw_body_after_json_drops_implicit_content_type() {
        let req = get("http://localhost/")
            .with_json(&json!({"a": 1}))
            .with_body("plain")
            .build()
            .unwrap();
        assert!(req.headers().get_first("content-type").is_none());
        assert_eq!(req.body(), &Body::Raw(Bytes::from_static(b"plain")));
    }

    #[test]
    fn explicit_content_type_survives_body_change() {
        let req = get("http://localhost/")
            .with_json(&json!({"a": 1}))
            .header("Content-Type", "application/vnd.custom+json")
            .with_body("x")
            .build()
            .unwrap();
        assert_eq!(
            req.headers().get_first("content-type"),
            Some("application/vnd.custom+json")
        );
    }

    #[test]
    fn form_sets_content_type() {
        let req = get("http://localhost/")
            .with_form(&json!({"n": 2.5}))
            .build()
            .unwrap();
        assert_eq!(req.headers().get_first("Content-Type"), Some(form::CONTENT_TYPE));
        assert_eq!(req.body().encode().unwrap().unwrap(), Bytes::from_static(b"n=2.5"));
    }

    #[test]
    fn basic_auth_header() {
        let req = get("http://localhost/")
            .with_basic_auth("user", "pa:ss")
            .build()
            .unwrap();
        assert_eq!(
            req.headers().get_first("authorization"),
            Some("Basic dXNlcjpwYTpzcw==")
        );
        assert!(get("http://localhost/").with_basic_auth("a:b", "c").build().is_err());
    }

    #[test]
    fn cookies_become_one_header() {
        let req = get("http://localhost/")
            .with_safe_cookies([("a", "1"), ("b", "x; y")])
            .build()
            .unwrap();
        assert_eq!(req.headers().get_all("cookie"), vec!["a=1; b=x%3B%20y"]);
    }

    #[test]
    fn first_error_is_kept() {
        let err = get("http://localhost/")
            .header("bad name", "v")
            .header("x-fine", "v")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
        assert!(matches!(get("nope").build(), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn send_reports_builder_error_before_connecting() {
        let err = get("http://localhost:1/").header("x", "").send().await.unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }
}
