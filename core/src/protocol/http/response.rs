/*
 * response.rs
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

//! HTTP response: status and headers up front, body pulled lazily from the connection.
//!
//! Two ways to consume the body, both over the same cursor:
//! - `iter_frames()` / `next_frame()` yield body bytes as the transport delivers them;
//! - `bytes()`, `text()` and `json()` drain whatever is left and buffer it in memory.
//!
//! Buffering is a convenience for ordinary responses, not for unbounded streams.
//! Mixing the two is allowed: each call sees only the bytes not yet consumed, so
//! `text()` after a partial frame loop returns the remainder, and frames after
//! `text()` yield nothing. The connection is closed as soon as the body has been
//! fully read, on the first read error, or when the `Response` is dropped.

use bytes::{Bytes, BytesMut};
use log::trace;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::protocol::http::connection::{HttpConnection, ResponseHead};
use crate::protocol::http::h1::Version;
use crate::protocol::http::headers::HeaderMap;

#[derive(Debug)]
pub struct Response {
    head: ResponseHead,
    /// Open while body bytes may remain.
    conn: Option<HttpConnection>,
}

impl Response {
    pub(crate) fn new(head: ResponseHead, conn: HttpConnection) -> Self {
        let conn = if conn.is_complete() {
            trace!("response {} has no body; closing connection", head.status);
            None
        } else {
            Some(conn)
        };
        Self { head, conn }
    }

    pub fn status_code(&self) -> u16 {
        self.head.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.head.status)
    }

    /// Reason phrase from the status line; may be empty.
    pub fn reason(&self) -> &str {
        &self.head.reason
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// First value of `name` (case-insensitive).
    pub fn header_first_value(&self, name: &str) -> Option<&str> {
        self.head.headers.get_first(name)
    }

    /// Every value of `name`, in the order the server sent them.
    pub fn header_all_values(&self, name: &str) -> Vec<&str> {
        self.head.headers.get_all(name)
    }

    /// `(index, name, value)` for every header, indices starting at 0.
    /// Each call starts a fresh iteration.
    pub fn iter_headers(&self) -> impl Iterator<Item = (usize, &str, &str)> + '_ {
        self.head
            .headers
            .iter()
            .enumerate()
            .map(|(i, (name, value))| (i, name, value))
    }

    /// Body frames in arrival order. Not restartable: frames handed out are gone.
    pub fn iter_frames(&mut self) -> Frames<'_> {
        Frames { response: self }
    }

    /// Next body frame, `None` at end of body.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        let conn = match self.conn.as_mut() {
            Some(c) => c,
            None => return Ok(None),
        };
        match conn.next_frame().await {
            Ok(Some(frame)) => Ok(Some(frame)),
            Ok(None) => {
                trace!("body complete; closing connection");
                self.conn = None;
                Ok(None)
            }
            Err(e) => {
                self.conn = None;
                Err(e)
            }
        }
    }

    /// True once the body has been read to the end (or failed) and the connection closed.
    pub fn is_drained(&self) -> bool {
        self.conn.is_none()
    }

    /// Drain the remaining body into memory.
    pub async fn bytes(&mut self) -> Result<Bytes> {
        let first = match self.next_frame().await? {
            Some(f) => f,
            None => return Ok(Bytes::new()),
        };
        let second = match self.next_frame().await? {
            Some(f) => f,
            None => return Ok(first),
        };
        let mut body = BytesMut::with_capacity(first.len() + second.len());
        body.extend_from_slice(&first);
        body.extend_from_slice(&second);
        while let Some(frame) = self.next_frame().await? {
            body.extend_from_slice(&frame);
        }
        Ok(body.freeze())
    }

    /// Remaining body as UTF-8 text.
    pub async fn text(&mut self) -> Result<String> {
        let body = self.bytes().await?;
        String::from_utf8(body.to_vec())
            .map_err(|e| Error::Decode(format!("body is not valid UTF-8: {}", e)))
    }

    /// Remaining body parsed as JSON. Use `serde_json::Value` for untyped access.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::Decode(format!("body is not valid JSON: {}", e)))
    }
}

/// Lazy, finite sequence of body frames borrowed from a `Response`.
pub struct Frames<'a> {
    response: &'a mut Response,
}

impl Frames<'_> {
    /// Next frame; `Ok(None)` ends the sequence.
    pub async fn next(&mut self) -> Result<Option<Bytes>> {
        self.response.next_frame().await
    }
}
