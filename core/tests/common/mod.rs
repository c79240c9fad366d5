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

//! In-process servers for integration tests: a JSON echo endpoint (plain or TLS)
//! and scripted raw responses.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_rustls::rustls;
use tokio_rustls::rustls::pki_types::pem::PemObject;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

pub const CA: &str = include_str!("../data/ca-crt.pem");
pub const CLIENT_CERT: &str = include_str!("../data/client1-crt.pem");
pub const CLIENT_KEY: &str = include_str!("../data/client1-key.pem");
pub const SERVER_CERT: &str = include_str!("../data/server-crt.pem");
pub const SERVER_KEY: &str = include_str!("../data/server-key.pem");
pub const ROGUE_SERVER_CERT: &str = include_str!("../data/rogue-server-crt.pem");
pub const ROGUE_SERVER_KEY: &str = include_str!("../data/rogue-server-key.pem");

/// What the echo server saw.
pub struct Received {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Read one request: head up to the blank line, then a Content-Length or chunked body.
pub async fn read_request<S: AsyncRead + Unpin>(stream: &mut S) -> std::io::Result<Received> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    let head_end = loop {
        if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break i;
        }
        let n = stream.read(&mut tmp).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&tmp[..n]);
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut rest = buf[head_end + 4..].to_vec();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ');
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    };

    let body = if header("transfer-encoding").map_or(false, |v| v.contains("chunked")) {
        let mut body = Vec::new();
        loop {
            while !rest.windows(2).any(|w| w == b"\r\n") {
                let n = stream.read(&mut tmp).await?;
                rest.extend_from_slice(&tmp[..n]);
            }
            let line_end = rest.windows(2).position(|w| w == b"\r\n").unwrap();
            let size = usize::from_str_radix(std::str::from_utf8(&rest[..line_end]).unwrap(), 16).unwrap();
            rest.drain(..line_end + 2);
            while rest.len() < size + 2 {
                let n = stream.read(&mut tmp).await?;
                rest.extend_from_slice(&tmp[..n]);
            }
            body.extend_from_slice(&rest[..size]);
            rest.drain(..size + 2);
            if size == 0 {
                break body;
            }
        }
    } else {
        let len: usize = header("content-length").and_then(|v| v.parse().ok()).unwrap_or(0);
        while rest.len() < len {
            let n = stream.read(&mut tmp).await?;
            if n == 0 {
                break;
            }
            rest.extend_from_slice(&tmp[..n]);
        }
        rest.truncate(len);
        rest
    };
    Ok(Received {
        method,
        path,
        headers,
        body,
    })
}

/// JSON description of a request, the way the echo endpoint reports it.
pub fn describe(req: &Received) -> Value {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (k, v) in &req.headers {
        headers
            .entry(k.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(v);
            })
            .or_insert_with(|| v.clone());
    }
    let body = String::from_utf8_lossy(&req.body).to_string();
    let parsed: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
    json!({
        "method": req.method,
        "path": req.path,
        "headers": headers,
        "body": body,
        "json": parsed,
    })
}

async fn echo<S: AsyncRead + AsyncWrite + Unpin>(mut stream: S) {
    let req = match read_request(&mut stream).await {
        Ok(r) => r,
        Err(_) => return,
    };
    let body = serde_json::to_vec(&describe(&req)).unwrap();
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nX-Echo: first\r\nx-echo: second\r\nContent-Length: {}\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(&body).await;
    let _ = stream.shutdown().await;
}

/// Plain-HTTP echo server on 127.0.0.1; serves any number of connections.
pub async fn spawn_echo() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            tokio::spawn(echo(tcp));
        }
    });
    addr
}

fn certs(pem: &str) -> Vec<CertificateDer<'static>> {
    CertificateDer::pem_slice_iter(pem.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// TLS server config presenting `cert`/`key`; requires a client certificate issued by the test CA.
pub fn mtls_server_config(cert: &str, key: &str) -> Arc<rustls::ServerConfig> {
    let mut roots = rustls::RootCertStore::empty();
    for ca in certs(CA) {
        roots.add(ca).unwrap();
    }
    let verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .unwrap();
    let config = rustls::ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs(cert), PrivateKeyDer::from_pem_slice(key.as_bytes()).unwrap())
        .unwrap();
    Arc::new(config)
}

/// TLS echo server bound to `bind` (e.g. "127.0.0.1:0" or "[::1]:0").
/// Returns None when the address family is unavailable.
pub async fn spawn_tls_echo(bind: &str, config: Arc<rustls::ServerConfig>) -> Option<SocketAddr> {
    let listener = TcpListener::bind(bind).await.ok()?;
    let addr = listener.local_addr().ok()?;
    let acceptor = TlsAcceptor::from(config);
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(tls) = acceptor.accept(tcp).await {
                    echo(tls).await;
                }
            });
        }
    });
    Some(addr)
}

/// Serve one connection: read the request, then write each piece with a short pause.
pub async fn spawn_script(pieces: Vec<Vec<u8>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut tcp, _)) = listener.accept().await {
            let _ = read_request(&mut tcp).await;
            for piece in pieces {
                if tcp.write_all(&piece).await.is_err() {
                    return;
                }
                let _ = tcp.flush().await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            let _ = tcp.shutdown().await;
        }
    });
    addr
}

/// Serve one connection with `response`, then report once the client has closed its end.
pub async fn spawn_watch_close(response: Vec<u8>) -> (SocketAddr, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Ok((mut tcp, _)) = listener.accept().await {
            let _ = read_request(&mut tcp).await;
            let _ = tcp.write_all(&response).await;
            let mut sink = [0u8; 1024];
            loop {
                match tcp.read(&mut sink).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            let _ = tx.send(());
        }
    });
    (addr, rx)
}

/// Accept connections and never answer.
pub async fn spawn_silent() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held: Vec<TcpStream> = Vec::new();
        while let Ok((tcp, _)) = listener.accept().await {
            held.push(tcp);
        }
    });
    addr
}
