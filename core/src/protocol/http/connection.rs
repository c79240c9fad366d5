/*
 * connection.rs
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

//! HTTP connection: one TCP or TLS stream carrying exactly one request/response.
//!
//! Writes the serialized request, drives the H1 parser until the head is complete,
//! then hands out body frames one read at a time.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tokio_rustls::rustls;

use crate::error::{Error, Result, TlsError};
use crate::protocol::http::h1::{
    body_mode, writer, H1ResponseHandler, ParseState, ResponseParser, Version,
};
use crate::protocol::http::headers::HeaderMap;
use crate::protocol::http::request::Request;

/// Read granularity; a frame is at most what one read returns.
const READ_CHUNK: usize = 8192;

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
#[derive(Debug)]
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl HttpStream {
    pub fn is_tls(&self) -> bool {
        matches!(self, HttpStream::Tls(_))
    }
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Status line and headers of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub version: Version,
    pub status: u16,
    pub reason: String,
    pub headers: HeaderMap,
}

/// Collects parser events: head fields, then body frames.
#[derive(Default)]
struct Sink {
    status: Option<(Version, u16, String)>,
    headers: HeaderMap,
    frames: VecDeque<Bytes>,
}

impl H1ResponseHandler for Sink {
    fn status(&mut self, version: Version, code: u16, reason: &str) {
        self.status = Some((version, code, reason.to_string()));
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.add(name, value);
    }

    fn body_chunk(&mut self, data: Bytes) {
        if !data.is_empty() {
            self.frames.push_back(data);
        }
    }

    fn complete(&mut self) {}
}

/// One request/response exchange over a connected stream.
pub struct HttpConnection {
    stream: HttpStream,
    read_buf: BytesMut,
    parser: ResponseParser,
    sink: Sink,
    read_timeout: Duration,
}

impl HttpConnection {
    pub fn new(stream: HttpStream, read_timeout: Duration) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            parser: ResponseParser::new(),
            sink: Sink::default(),
            read_timeout,
        }
    }

    /// Serialize and write the request, then flush.
    pub async fn write_request(&mut self, request: &Request) -> Result<()> {
        let wire = writer::encode_request(request)?;
        timeout(self.read_timeout, write_flush(&mut self.stream, &wire))
            .await
            .map_err(|_| Error::Timeout("request write timed out"))?
            .map_err(transport_error)?;
        debug!(
            "{} {} written ({} headers, {} bytes)",
            request.method().as_str(),
            request.target().path_and_query(),
            request.headers().len(),
            wire.len()
        );
        Ok(())
    }

    /// Read until the status line and headers are complete. Interim 1xx responses
    /// are skipped. Leaves the parser positioned at the start of the body.
    pub async fn read_head(&mut self) -> Result<ResponseHead> {
        loop {
            self.parser.receive(&mut self.read_buf, &mut self.sink)?;
            if self.parser.state() != ParseState::HeadersComplete {
                if self.fill().await? == 0 {
                    self.parser.receive_eof(&mut self.sink)?;
                }
                continue;
            }
            let (version, status, reason) = self
                .sink
                .status
                .take()
                .ok_or_else(|| Error::protocol("missing status line"))?;
            let headers = std::mem::take(&mut self.sink.headers);
            if (100..200).contains(&status) && status != 101 {
                trace!("skipping interim {} response", status);
                self.parser.reset();
                continue;
            }
            let mode = body_mode(version, status, &headers)?;
            debug!(
                "response {} ({} headers, body {:?})",
                status,
                headers.len(),
                mode
            );
            self.parser.set_body_mode(mode, &mut self.sink);
            return Ok(ResponseHead {
                version,
                status,
                reason,
                headers,
            });
        }
    }

    /// Next body frame in arrival order; `None` once the body is complete.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(frame) = self.sink.frames.pop_front() {
                trace!("frame of {} bytes", frame.len());
                return Ok(Some(frame));
            }
            if self.parser.is_complete() {
                return Ok(None);
            }
            if !self.read_buf.is_empty() {
                let before = self.read_buf.len();
                self.parser.receive(&mut self.read_buf, &mut self.sink)?;
                if self.read_buf.len() != before || self.parser.is_complete() {
                    continue;
                }
            }
            if self.fill().await? == 0 {
                self.parser.receive_eof(&mut self.sink)?;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.parser.is_complete() && self.sink.frames.is_empty()
    }

    /// One read from the transport into the buffer. Returns 0 on EOF.
    async fn fill(&mut self) -> Result<usize> {
        self.read_buf.reserve(READ_CHUNK);
        let read = timeout(self.read_timeout, self.stream.read_buf(&mut self.read_buf))
            .await
            .map_err(|_| Error::Timeout("read timed out"))?;
        let n = match read {
            Ok(n) => n,
            // rustls reports a close without close_notify this way; the parser decides
            // whether that cut the response short.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
            Err(e) => return Err(transport_error(e)),
        };
        trace!("read {} bytes", n);
        Ok(n)
    }
}

async fn write_flush(stream: &mut HttpStream, data: &[u8]) -> io::Result<()> {
    stream.write_all(data).await?;
    stream.flush().await
}

/// TLS alerts after the handshake (e.g. the server refusing our certificate under
/// TLS 1.3) arrive as rustls errors inside io::Error; keep them as TLS failures.
fn transport_error(e: io::Error) -> Error {
    let is_tls = e
        .get_ref()
        .map_or(false, |inner| inner.is::<rustls::Error>());
    if is_tls {
        Error::Tls(TlsError::from_io(e))
    } else {
        Error::Io(e)
    }
}

impl std::fmt::Debug for HttpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection")
            .field("tls", &self.stream.is_tls())
            .field("state", &self.parser.state())
            .field("buffered", &self.read_buf.len())
            .finish()
    }
}
