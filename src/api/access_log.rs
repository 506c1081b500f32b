//! Access logging in Common Log Format.
//!
//! One line per request is emitted under the `access_log` tracing target once
//! the response is ready. The middleware only observes; it never alters or
//! short-circuits the response.

use axum::body::{Body, HttpBody};
use axum::extract::ConnectInfo;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;
use tracing::info;

pub const ACCESS_LOG_TARGET: &str = "access_log";

/// A single access log record.
#[derive(Debug, Clone)]
pub struct AccessLogLine {
    pub client: Option<IpAddr>,
    pub timestamp: DateTime<Utc>,
    pub method: Method,
    pub path: String,
    pub status: u16,
    pub body_bytes: u64,
}

impl fmt::Display for AccessLogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.client {
            Some(ip) => write!(f, "{}", ip.to_canonical())?,
            None => f.write_str("Unknown IP")?,
        }
        write!(
            f,
            " - - [{}] \"{} {} HTTP/1.1\" {} {}",
            self.timestamp.format("%d/%b/%Y:%H:%M:%S +0000"),
            self.method,
            self.path,
            self.status,
            self.body_bytes
        )
    }
}

/// Middleware recording one access log line per request.
pub async fn log_request(request: Request<Body>, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let timestamp = Utc::now();
    let started = Instant::now();

    let response = next.run(request).await;

    let line = AccessLogLine {
        client,
        timestamp,
        method,
        path,
        status: response.status().as_u16(),
        body_bytes: response.body().size_hint().exact().unwrap_or(0),
    };
    info!(
        target: ACCESS_LOG_TARGET,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{line}"
    );

    response
}
