//! Shared test support utilities for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wget_core::http::TransportRequest;
use wget_core::{HttpClient, HttpClientConfig, Response, StatusCode, Transport, TransportError, TransportErrorKind};

/// One request as seen by [`RecordingTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Mock transport that records every attempt
///
/// URLs containing one of the `failing` markers get a connect error; every
/// other URL answers with `status` and `body`.
pub struct RecordingTransport {
    failing: Vec<String>,
    status: StatusCode,
    body: Bytes,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Self::build(Vec::new(), StatusCode::OK)
    }

    pub fn failing(markers: &[&str]) -> Arc<Self> {
        Self::build(markers.iter().map(|m| m.to_string()).collect(), StatusCode::OK)
    }

    pub fn with_status(status: StatusCode) -> Arc<Self> {
        Self::build(Vec::new(), status)
    }

    fn build(failing: Vec<String>, status: StatusCode) -> Arc<Self> {
        Arc::new(Self {
            failing,
            status,
            body: Bytes::from_static(b"{}"),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// All attempts so far, failed ones included
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

/// Client whose every attempt goes through `transport`
pub fn client_for(transport: &Arc<RecordingTransport>) -> HttpClient {
    HttpClient::with_transport(transport.clone(), HttpClientConfig::default())
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: TransportRequest<'_>) -> Result<Response, TransportError> {
        let body = match request.body {
            Some(stream) => Some(
                stream
                    .read_to_vec()
                    .map_err(|e| TransportError::from_body_error(&request.url, e))?,
            ),
            None => None,
        };

        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method.to_string(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body,
        });

        if self.failing.iter().any(|m| request.url.contains(m.as_str())) {
            return Err(TransportError::new(
                TransportErrorKind::Connect,
                request.url,
                "connection refused",
            ));
        }

        Ok(Response::buffered(
            self.status,
            request.url,
            HeaderMap::new(),
            self.body.clone(),
        ))
    }
}

/// Local HTTP/1.1 server answering every connection with `response`
///
/// Returns the base URL and the raw requests it received.
pub async fn spawn_responder(response: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = seen.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = log.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                log.lock().unwrap().push(request);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), seen)
}

/// Local server that accepts connections and never answers
pub async fn spawn_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);

        if let Some(end) = find_header_end(&data) {
            let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}
