//! Single-URL fetch task
//!
//! One task per URL: validate, resolve, connect, request, classify. Every
//! code path terminates in a [`FetchOutcome`]; nothing escapes task scope.

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper::{Request, Uri, header};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::outcome::FetchOutcome;

/// Budget for the connect phase and, separately, the request phase.
/// The read phase deliberately carries no timeout.
const IO_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("fetchfan/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("scheme not supported: '{0}'")]
    UnsupportedScheme(String),

    #[error("empty host not allowed")]
    EmptyHost,

    #[error("resolve failed: {0}")]
    Resolution(String),

    #[error("connect timed out")]
    ConnectTimeout,

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    RequestTimeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("got http status {0}")]
    HttpStatus(u16),

    #[error("got http empty body")]
    EmptyBody,
}

/// Fetch one URL. Infallible at the signature: every failure is folded
/// into the outcome's `Err` text.
pub async fn http_get(url: &str) -> FetchOutcome {
    match fetch(url).await {
        Ok(body) => FetchOutcome::Ok(body),
        Err(error) => FetchOutcome::Err(error.to_string()),
    }
}

/// Validated connection target for one fetch.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    host: String,
    port: u16,
    path: String,
}

fn parse_target(url: &str) -> Result<Target, FetchError> {
    let uri: Uri = url
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| FetchError::InvalidUrl(e.to_string()))?;

    match uri.scheme_str() {
        Some("http") => {}
        other => {
            return Err(FetchError::UnsupportedScheme(
                other.unwrap_or_default().to_string(),
            ));
        }
    }

    let host = match uri.host() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(FetchError::EmptyHost),
    };

    let port = uri.port_u16().unwrap_or(80);

    let path = match uri.path_and_query() {
        Some(pq) if !pq.as_str().is_empty() => pq.as_str().to_string(),
        _ => "/".to_string(),
    };

    Ok(Target { host, port, path })
}

async fn fetch(url: &str) -> Result<String, FetchError> {
    let target = parse_target(url)?;

    let addrs: Vec<SocketAddr> = lookup_host((target.host.as_str(), target.port))
        .await
        .map_err(|e| FetchError::Resolution(e.to_string()))?
        .collect();
    if addrs.is_empty() {
        return Err(FetchError::Resolution(format!(
            "no addresses for {}",
            target.host
        )));
    }

    let stream = match timeout(IO_TIMEOUT, connect_any(&addrs)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(FetchError::Connect(e.to_string())),
        Err(_) => return Err(FetchError::ConnectTimeout),
    };

    let (mut request_tx, connection) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    // The connection task owns the socket and shuts it down gracefully
    // once the request handle and body are done; teardown errors also
    // surface through send_request, so only log them here.
    tokio::spawn(async move {
        if let Err(error) = connection.await {
            debug!(%error, "connection teardown");
        }
    });

    let request = Request::get(target.path.as_str())
        .header(header::HOST, target.host.as_str())
        .header(header::USER_AGENT, USER_AGENT)
        .body(Empty::<Bytes>::new())
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let response = match timeout(IO_TIMEOUT, request_tx.send_request(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(FetchError::Transport(e.to_string())),
        Err(_) => return Err(FetchError::RequestTimeout),
    };

    let status = response.status();

    // No timeout on the read phase.
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?
        .to_bytes();

    drop(request_tx);

    if !status.is_success() {
        warn!(url, status = status.as_u16(), "got non-success status");
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    if body.is_empty() {
        warn!(url, "got empty body");
        return Err(FetchError::EmptyBody);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

async fn connect_any(addrs: &[SocketAddr]) -> std::io::Result<TcpStream> {
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no addresses")))
}
