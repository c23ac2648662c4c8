//! Compute-offload HTTP service ("sleepy server")
//!
//! Emulates CPU-heavy request handling: `GET /<delay>` runs a simulated
//! job on an independent worker-thread pool while the connection loop
//! stays free for other requests. Everything else is answered directly
//! in the I/O domain.

mod pool;

pub use pool::{OffloadError, WorkerPool};

use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::shutdown::shutdown_signal;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(address: SocketAddr, workers: usize) -> Result<(), AnyError> {
    let pool = Arc::new(WorkerPool::start(workers));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "sleepy service listening");

    axum::serve(listener, router(pool).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// The whole route space is the delay pattern plus two error answers,
/// so a single fallback handler replaces a route table.
pub fn router(pool: Arc<WorkerPool>) -> Router {
    Router::new().fallback(handle).with_state(pool)
}

async fn handle(State(pool): State<Arc<WorkerPool>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        error!(%method, "bad http method");
        return (StatusCode::BAD_REQUEST, "Unknown HTTP-method").into_response();
    }

    let Some(delay) = parse_delay(uri.path()) else {
        return (StatusCode::NOT_FOUND, "Not found\n").into_response();
    };

    info!(delay, "scheduling background job");
    match pool.submit(move || background_job(delay)).await {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(error) => {
            error!(%error, "background job lost");
            (StatusCode::INTERNAL_SERVER_ERROR, "job lost").into_response()
        }
    }
}

/// Accepts `/<digits>` or `/<digits>.<digits>`, nothing else.
fn parse_delay(path: &str) -> Option<f64> {
    let raw = path.strip_prefix('/')?;

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let mut parts = raw.splitn(3, '.');
    if !parts.next().is_some_and(all_digits) {
        return None;
    }
    if let Some(frac) = parts.next() {
        if !all_digits(frac) || parts.next().is_some() {
            return None;
        }
    }

    raw.parse::<f64>()
        .ok()
        .filter(|delay| Duration::try_from_secs_f64(*delay).is_ok())
}

/// Emulates a CPU-intensive job. Runs on a pool thread, never on the
/// connection-handling runtime.
fn background_job(delay: f64) -> String {
    let started = current_time_string();
    info!(delay, "background job starts");
    // parse_delay guarantees the delay fits a Duration.
    std::thread::sleep(Duration::from_secs_f64(delay));
    let finished = current_time_string();
    info!(delay, "background job ends");

    format!("Slept {delay:.3} s from {started} to {finished}")
}

/// Local date and time with millisecond precision.
fn current_time_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
