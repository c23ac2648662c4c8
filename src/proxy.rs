//! WebSocket fetch proxy -- session engine and listener.
//!
//! One session per accepted connection. Each inbound text frame is a
//! whitespace-separated list of `http://` URLs; the reply frame is one
//! report line per URL, in completion order. Request/response alternation
//! is strictly sequential within a session, and one misbehaving session
//! never affects the others.

use axum::Router;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use axum::routing::any;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::fetch::fetch_all;
use crate::outcome::FetchOutcome;
use crate::shutdown::shutdown_signal;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(address: SocketAddr) -> Result<(), AnyError> {
    let listener = TcpListener::bind(address).await?;
    info!(%address, "fetch proxy listening");

    axum::serve(listener, router().into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// The proxy speaks WebSocket on the root path and nothing else.
pub fn router() -> Router {
    Router::new().route("/", any(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(run_session)
}

/// Session lifecycle after the upgrade handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Active,
    Closing,
    Closed,
}

async fn run_session(mut socket: WebSocket) {
    info!("client connected");
    let mut state = SessionState::Active;

    while state == SessionState::Active {
        state = match socket.recv().await {
            None => {
                info!("client disconnected");
                SessionState::Closing
            }
            Some(Err(error)) => {
                error!(%error, "session transport error");
                SessionState::Closing
            }
            Some(Ok(Message::Close(_))) => {
                info!("client disconnected");
                SessionState::Closing
            }
            Some(Ok(Message::Text(line))) => {
                let urls = split_request_line(line.as_str());
                let outcomes = fetch_all(&urls).await;
                let report = render_report(&outcomes);

                match socket.send(Message::Text(report.into())).await {
                    Ok(()) => SessionState::Active,
                    Err(error) => {
                        error!(%error, "failed to send report");
                        SessionState::Closing
                    }
                }
            }
            // Ping/pong and binary frames carry no request.
            Some(Ok(_)) => SessionState::Active,
        };
    }

    state = SessionState::Closed;
    debug!(?state, "session finished");
}

/// Trim and split one request frame into URL tokens. Runs of
/// tab/space/newline/carriage-return separators never produce empty
/// tokens; an all-whitespace frame yields no URLs at all.
fn split_request_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}

/// One newline-terminated `Ok(...)`/`Err(...)` line per outcome.
fn render_report(outcomes: &[FetchOutcome]) -> String {
    let mut report = String::new();
    for outcome in outcomes {
        report.push_str(&outcome.render());
        report.push('\n');
    }
    report
}
