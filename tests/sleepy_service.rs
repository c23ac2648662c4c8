//! Integration tests for the compute-offload service
//!
//! Drives the router directly with `tower::ServiceExt::oneshot`; the
//! worker pool underneath is real, so these exercise the full offload
//! path including the cross-domain reply channel.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use fetchfan::sleepy::{WorkerPool, router};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tower::ServiceExt;

fn test_router(workers: usize) -> (Router, Arc<WorkerPool>) {
    let pool = Arc::new(WorkerPool::start(workers));
    (router(pool.clone()), pool)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn test_get_delay_sleeps_and_reports() {
    let (app, _pool) = test_router(1);

    let request = Request::get("/0.5").body(Body::empty()).unwrap();
    let started = Instant::now();
    let (status, body) = send(app, request).await;
    let elapsed = started.elapsed();

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("Slept 0.500 s from "), "{body}");
    assert!(body.contains(" to "), "{body}");
    assert!(elapsed >= Duration::from_millis(500));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (app, _pool) = test_router(1);

    let request = Request::get("/abc").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not found\n");
}

#[tokio::test]
async fn test_non_get_method_is_bad_request() {
    let (app, _pool) = test_router(1);

    let request = Request::post("/0.5").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Unknown HTTP-method");
}

#[tokio::test]
async fn test_root_path_is_not_found() {
    let (app, _pool) = test_router(1);

    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, _body) = send(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_jobs_overlap_across_workers() {
    let (app, pool) = test_router(2);
    let app2 = router(pool);

    let first = Request::get("/0.4").body(Body::empty()).unwrap();
    let second = Request::get("/0.4").body(Body::empty()).unwrap();

    let started = Instant::now();
    let (a, b) = tokio::join!(send(app, first), send(app2, second));
    let elapsed = started.elapsed();

    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    // Serialized onto one worker this would need at least 800ms.
    assert!(
        elapsed < Duration::from_millis(750),
        "offloaded jobs serialized: {elapsed:?}"
    );
}
