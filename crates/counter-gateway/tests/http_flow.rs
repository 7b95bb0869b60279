//! Router-level request handling, no socket.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use counter_core::error::Result;
use counter_core::{CounterError, CounterValue, StoreError};
use counter_gateway::app_state::AppState;
use counter_gateway::config::CounterConfig;
use counter_gateway::counter::{IncreaseCounter, COUNTER_KEY};
use counter_gateway::router::build_router;
use counter_gateway::store::{IncrementStore, MemoryStore, RedisStore};

mod support;

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Option<String>, String) {
    let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_owned());
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

fn memory_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(&CounterConfig::default(), store.clone());
    (build_router(state), store)
}

#[tokio::test]
async fn first_and_second_request() {
    let (app, store) = memory_app();

    let (status, content_type, body) = call(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
    assert_eq!(body, "counter: 1");

    let (_, _, body) = call(&app, Method::GET, "/").await;
    assert_eq!(body, "counter: 2");
    assert_eq!(store.get(COUNTER_KEY), Some(2));
}

#[tokio::test]
async fn any_method_and_path_increments() {
    let (app, _) = memory_app();

    let reqs = [
        (Method::POST, "/"),
        (Method::PUT, "/anything"),
        (Method::DELETE, "/a/b/c?x=1"),
        (Method::GET, "/favicon.ico"),
    ];
    for (i, (method, uri)) in reqs.into_iter().enumerate() {
        let (status, _, body) = call(&app, method, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("counter: {}", i + 1));
    }
}

#[tokio::test]
async fn unreachable_store_is_a_bare_500() {
    let addr = support::closed_addr().await;
    let store: Arc<dyn IncrementStore> =
        Arc::new(RedisStore::new(addr.to_string(), Duration::from_secs(1), 4, 16));
    let app = build_router(AppState::new(&CounterConfig::default(), store));

    let (logs, _guard) = support::capture_logs();
    let (status, _, body) = call(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());

    let text = logs.text();
    let line = text
        .lines()
        .find(|l| l.contains("request failed"))
        .unwrap_or_else(|| panic!("no request failed event in:\n{text}"));
    assert!(line.starts_with("ERROR"), "{line}");
    assert!(line.contains(r#"code="STORE_UNAVAILABLE""#), "{line}");
    assert!(line.contains(&format!("error=increase counter: connect {addr}: ")), "{line}");
}

struct TooWide;

#[async_trait]
impl IncreaseCounter for TooWide {
    async fn increase(&self) -> Result<CounterValue> {
        Err(CounterError::EncodingImpossible { value: i64::MAX })
    }
}

#[tokio::test]
async fn unrepresentable_counter_is_a_bare_500() {
    let app = build_router(AppState::with_counter(Arc::new(TooWide), Duration::from_secs(1)));

    let (logs, _guard) = support::capture_logs();
    let (status, _, body) = call(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());

    let text = logs.text();
    assert!(text.contains(r#"code="ENCODING_IMPOSSIBLE""#), "{text}");
    assert!(text.contains("does not fit the reporting width"), "{text}");
}

struct Stuck;

#[async_trait]
impl IncreaseCounter for Stuck {
    async fn increase(&self) -> Result<CounterValue> {
        std::future::pending::<()>().await;
        Err(CounterError::StoreUnavailable {
            op: "increase counter",
            source: StoreError::Timeout,
        })
    }
}

#[tokio::test]
async fn request_deadline_bounds_a_stuck_store() {
    let app = build_router(AppState::with_counter(Arc::new(Stuck), Duration::from_millis(50)));

    let started = std::time::Instant::now();
    let (status, _, body) = call(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn failures_do_not_consume_values() {
    let (addr, fake) = support::spawn_fake_redis().await;
    let store: Arc<dyn IncrementStore> =
        Arc::new(RedisStore::new(addr.to_string(), Duration::from_secs(1), 4, 16));
    let app = build_router(AppState::new(&CounterConfig::default(), store));

    fake.set_broken(true);
    let (status, _, _) = call(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    fake.set_broken(false);
    let (status, _, body) = call(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "counter: 1");
}
