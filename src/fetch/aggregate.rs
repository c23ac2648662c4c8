//! Fan-out/fan-in aggregation over the capacity-one result channel.

use tracing::{error, info};

use super::client;
use crate::outcome::FetchOutcome;
use crate::rendezvous;

/// Fetch every URL concurrently and collect exactly one outcome per URL.
///
/// Spawns one detached task per URL, each of which ends by sending its
/// outcome on a shared channel; this loop then performs exactly N
/// receives. A failed fetch occupies one slot as an `Err` outcome and
/// never aborts its siblings.
///
/// Outcomes arrive first-come-first-served, so the returned order is
/// completion order, not input order.
pub async fn fetch_all(urls: &[String]) -> Vec<FetchOutcome> {
    let n = urls.len();
    if n == 0 {
        return Vec::new();
    }

    let (outcome_tx, mut outcome_rx) = rendezvous::channel();

    for url in urls {
        info!(%url, "requesting");
        let url = url.clone();
        let outcome_tx = outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = client::http_get(&url).await;
            // The receiver is gone when the session tore down
            // mid-aggregation; the outcome is discarded in that case.
            let _ = outcome_tx.send(outcome).await;
        });
    }
    drop(outcome_tx);

    let mut outcomes = Vec::with_capacity(n);
    for _ in 0..n {
        let Some(outcome) = outcome_rx.recv().await else {
            // Unreachable: each of the n tasks sends exactly once.
            break;
        };
        match &outcome {
            FetchOutcome::Ok(body) => info!(bytes = body.len(), "got reply"),
            FetchOutcome::Err(message) => error!(%message, "got error"),
        }
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::time::Instant;

    async fn spawn_origin() -> SocketAddr {
        let app = Router::new()
            .route("/hello", get(|| async { "hello world" }))
            .route("/empty", get(|| async { "" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "finally"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        assert!(fetch_all(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_one_outcome_per_url() {
        let origin = spawn_origin().await;
        let urls = vec![
            format!("http://{origin}/hello"),
            format!("http://{origin}/missing"),
            "https://example.com".to_string(),
        ];

        let outcomes = fetch_all(&urls).await;
        assert_eq!(outcomes.len(), 3);

        // Arrival order is unspecified; check contents as a set.
        assert!(outcomes.contains(&FetchOutcome::Ok("hello world".into())));
        assert!(outcomes.contains(&FetchOutcome::Err("got http status 404".into())));
        assert!(
            outcomes.contains(&FetchOutcome::Err("scheme not supported: 'https'".into()))
        );
    }

    #[tokio::test]
    async fn test_empty_body_classified_as_error() {
        let origin = spawn_origin().await;
        let urls = vec![format!("http://{origin}/empty")];

        let outcomes = fetch_all(&urls).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].err(), Some("got http empty body"));
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let origin = spawn_origin().await;
        let urls = vec![
            format!("http://{origin}/slow"),
            format!("http://{origin}/slow"),
            format!("http://{origin}/slow"),
        ];

        let started = Instant::now();
        let outcomes = fetch_all(&urls).await;
        let elapsed = started.elapsed();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(FetchOutcome::is_ok));

        // Sequential execution would need at least 1500ms.
        assert!(elapsed >= Duration::from_millis(500));
        assert!(
            elapsed < Duration::from_millis(1400),
            "fan-out took {elapsed:?}, looks sequential"
        );
    }
}
