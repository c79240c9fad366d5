/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, body (Content-Length,
//! chunked, or until close).
//!
//! Feed bytes via `receive`; the handler is invoked as complete tokens are parsed.
//! Body bytes are split off the read buffer without copying.

use std::borrow::Cow;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::http::headers::{is_token_byte, HeaderMap};

/// Longest status or header line we accept before giving up on the peer.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Callback for HTTP/1.1 response events. The connection implements this.
pub trait H1ResponseHandler {
    fn status(&mut self, version: Version, code: u16, reason: &str);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: Bytes);
    fn trailer(&mut self, _name: &str, _value: &str) {}
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

/// How the body following the head is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    Empty,
    Length(u64),
    Chunked,
    UntilClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    StatusLine,
    Headers,
    /// Head done; connection must call `set_body_mode()`.
    HeadersComplete,
    Body,
    BodyUntilClose,
    ChunkSize,
    ChunkData,
    ChunkDataEnd,
    ChunkTrailer,
    /// Response fully received.
    Complete,
}

/// Push parser for one HTTP/1.1 response.
pub struct ResponseParser {
    state: ParseState,
    /// Bytes still expected for a Content-Length body or the current chunk.
    remaining: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            remaining: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    /// Back to the status line, e.g. after an interim 1xx response.
    pub fn reset(&mut self) {
        self.state = ParseState::StatusLine;
        self.remaining = 0;
    }

    /// Find CRLF in buf; return the offset of the CR.
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    /// Split one CRLF-terminated line off the buffer (without the CRLF).
    /// `None` means more data is needed.
    fn take_line(buf: &mut BytesMut, what: &str) -> Result<Option<BytesMut>> {
        match Self::find_crlf(buf) {
            Some(n) => {
                let mut line = buf.split_to(n + 2);
                line.truncate(n);
                Ok(Some(line))
            }
            None if buf.len() > MAX_LINE_LEN => {
                Err(Error::protocol(format!("{} longer than {} bytes", what, MAX_LINE_LEN)))
            }
            None => Ok(None),
        }
    }

    /// Consume and parse as much as possible from buf. Partial data remains in buf.
    pub fn receive<H: H1ResponseHandler>(&mut self, buf: &mut BytesMut, handler: &mut H) -> Result<()> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let line = match Self::take_line(buf, "status line")? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    let (version, code, reason) = parse_status_line(&line)?;
                    handler.status(version, code, &reason);
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line = match Self::take_line(buf, "header line")? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.state = ParseState::HeadersComplete;
                        return Ok(());
                    }
                    let (name, value) = parse_header_line(&line)?;
                    handler.header(name, &value);
                }
                ParseState::HeadersComplete => return Ok(()),
                ParseState::Body => {
                    let to_read = (buf.len() as u64).min(self.remaining) as usize;
                    if to_read > 0 {
                        handler.body_chunk(buf.split_to(to_read).freeze());
                        self.remaining -= to_read as u64;
                    }
                    if self.remaining == 0 {
                        self.finish(handler);
                    }
                }
                ParseState::BodyUntilClose => {
                    handler.body_chunk(buf.split().freeze());
                }
                ParseState::ChunkSize => {
                    let line = match Self::take_line(buf, "chunk size line")? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    self.remaining = parse_chunk_size(&line)?;
                    self.state = if self.remaining == 0 {
                        ParseState::ChunkTrailer
                    } else {
                        ParseState::ChunkData
                    };
                }
                ParseState::ChunkData => {
                    let to_read = (buf.len() as u64).min(self.remaining) as usize;
                    handler.body_chunk(buf.split_to(to_read).freeze());
                    self.remaining -= to_read as u64;
                    if self.remaining == 0 {
                        self.state = ParseState::ChunkDataEnd;
                    }
                }
                ParseState::ChunkDataEnd => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    if &buf[..2] != b"\r\n" {
                        return Err(Error::protocol("missing CRLF after chunk data"));
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
                ParseState::ChunkTrailer => {
                    let line = match Self::take_line(buf, "trailer line")? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.finish(handler);
                    } else {
                        let (name, value) = parse_header_line(&line)?;
                        handler.trailer(name, &value);
                    }
                }
                ParseState::Complete => return Ok(()),
            }
        }
        Ok(())
    }

    /// Called by the connection once the head is parsed (state HeadersComplete).
    pub fn set_body_mode<H: H1ResponseHandler>(&mut self, mode: BodyMode, handler: &mut H) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        match mode {
            BodyMode::Empty | BodyMode::Length(0) => self.finish(handler),
            BodyMode::Length(n) => {
                self.remaining = n;
                self.state = ParseState::Body;
            }
            BodyMode::Chunked => self.state = ParseState::ChunkSize,
            BodyMode::UntilClose => self.state = ParseState::BodyUntilClose,
        }
    }

    /// The peer closed the connection. Only a read-until-close body may end this way.
    pub fn receive_eof<H: H1ResponseHandler>(&mut self, handler: &mut H) -> Result<()> {
        match self.state {
            ParseState::Complete => Ok(()),
            ParseState::BodyUntilClose => {
                self.finish(handler);
                Ok(())
            }
            ParseState::StatusLine | ParseState::Headers | ParseState::HeadersComplete => Err(
                Error::protocol("connection closed before response head was complete"),
            ),
            _ => Err(Error::protocol("connection closed before end of response body")),
        }
    }

    fn finish<H: H1ResponseHandler>(&mut self, handler: &mut H) {
        self.state = ParseState::Complete;
        self.remaining = 0;
        handler.complete();
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reason phrases and field values may carry obs-text (0x80-0xFF). UTF-8 is kept
/// as is; anything else is read as Latin-1.
fn field_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// `HTTP/1.1 200 OK`; the reason phrase may be empty or missing.
fn parse_status_line(line: &[u8]) -> Result<(Version, u16, Cow<'_, str>)> {
    let malformed = || Error::protocol(format!("malformed status line {:?}", field_text(line)));
    let (version, rest) = if let Some(rest) = line.strip_prefix(b"HTTP/1.1 ") {
        (Version::Http11, rest)
    } else if let Some(rest) = line.strip_prefix(b"HTTP/1.0 ") {
        (Version::Http10, rest)
    } else {
        return Err(malformed());
    };
    let (code, reason) = match rest.iter().position(|&b| b == b' ') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, &b""[..]),
    };
    if code.len() != 3 || !code.iter().all(u8::is_ascii_digit) {
        return Err(Error::protocol(format!(
            "malformed status code in {:?}",
            field_text(line)
        )));
    }
    let code = code
        .iter()
        .fold(0u16, |n, &d| n * 10 + u16::from(d - b'0'));
    if !(100..=599).contains(&code) {
        return Err(Error::protocol(format!("status code {} out of range", code)));
    }
    Ok((version, code, field_text(reason)))
}

/// `Name: value`. Name must be a token; value trimmed of optional whitespace.
fn parse_header_line(line: &[u8]) -> Result<(&str, Cow<'_, str>)> {
    let colon = line.iter().position(|&b| b == b':').ok_or_else(|| {
        Error::protocol(format!("header line without colon {:?}", field_text(line)))
    })?;
    let name = &line[..colon];
    if name.is_empty() || !name.iter().all(|&b| is_token_byte(b)) {
        return Err(Error::protocol(format!(
            "malformed header name {:?}",
            field_text(name)
        )));
    }
    // tchar is ASCII
    let name = std::str::from_utf8(name).map_err(|_| Error::protocol("malformed header name"))?;
    let mut value = &line[colon + 1..];
    while let [b' ' | b'\t', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = value {
        value = rest;
    }
    Ok((name, field_text(value)))
}

/// Hex chunk size, optional `;ext` ignored.
fn parse_chunk_size(line: &[u8]) -> Result<u64> {
    let line = std::str::from_utf8(line).map_err(|_| Error::protocol("invalid chunk size"))?;
    let hex = line.split(';').next().unwrap_or(line).trim();
    if hex.is_empty() || hex.len() > 16 {
        return Err(Error::protocol(format!("invalid chunk size {:?}", line)));
    }
    u64::from_str_radix(hex, 16)
        .map_err(|_| Error::protocol(format!("invalid chunk size {:?}", line)))
}

/// Decide how the body is delimited from status and headers.
pub fn body_mode(version: Version, code: u16, headers: &HeaderMap) -> Result<BodyMode> {
    if (100..200).contains(&code) || code == 204 || code == 304 {
        return Ok(BodyMode::Empty);
    }
    let codings = headers.get_all("transfer-encoding");
    if !codings.is_empty() {
        let last = codings
            .iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .last();
        return Ok(match last {
            Some(c) if c.eq_ignore_ascii_case("chunked") => BodyMode::Chunked,
            _ => BodyMode::UntilClose,
        });
    }
    let mut length: Option<u64> = None;
    for value in headers.get_all("content-length") {
        for part in value.split(',') {
            let n = part
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::protocol(format!("invalid Content-Length {:?}", value)))?;
            match length {
                Some(prev) if prev != n => {
                    return Err(Error::protocol("conflicting Content-Length values"))
                }
                _ => length = Some(n),
            }
        }
    }
    if let Some(n) = length {
        return Ok(BodyMode::Length(n));
    }
    let closes = headers
        .get_all("connection")
        .iter()
        .flat_map(|v| v.split(','))
        .any(|t| t.trim().eq_ignore_ascii_case("close"));
    if closes || version == Version::Http10 {
        Ok(BodyMode::UntilClose)
    } else {
        Ok(BodyMode::Empty)
    }
}
