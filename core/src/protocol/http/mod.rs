/*
 * mod.rs
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

//! HTTP/1.1 client with push-parsed responses and pull-based body frames.
//!
//! - Requests: fluent `RequestBuilder` over an ordered, case-insensitive `HeaderMap`.
//! - Buffers: `bytes` crate (BytesMut for the read buffer, Bytes for frames).
//! - One connection per request, plain TCP or TLS; no pooling, no redirects.

mod request;
mod response;

pub mod client;
pub mod connection;
pub mod cookie;
pub mod form;
pub mod h1;
pub mod headers;

pub use client::{HttpClient, HttpClientBuilder};
pub use connection::{HttpConnection, HttpStream, ResponseHead};
pub use headers::HeaderMap;
pub use request::{Body, Method, Request, RequestBuilder, JSON_CONTENT_TYPE};
pub use response::{Frames, Response};
