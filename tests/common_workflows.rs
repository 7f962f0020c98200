//! Integration tests for common relay workflows.
//!
//! These tests verify that the usual decorator stacks work end to end.

use relay::prelude::*;
use relay::{HostPoolConfig, drain_close};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> SharedClient {
    Arc::new(HttpClientConfig::default().build_client().unwrap())
}

// =============================================================================
// Full Stack Tests
// =============================================================================

#[tokio::test]
async fn test_pooled_json_api_with_retry_and_logging() {
    let mut servers = Vec::new();
    for _ in 0..3 {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 42})),
            )
            .mount(&server)
            .await;
        servers.push(server);
    }

    let pool = StaticClientPool::from_config(
        HostPoolConfig::builder(servers.iter().map(|s| format!("{}/v1/", s.uri())))
            .decay_duration(Duration::from_secs(60))
            .seed(99)
            .build(),
    )
    .unwrap();

    let client = Decorated::from_shared(transport())
        .with(Logged::new())
        .with(FaultTolerant::new(3, Duration::from_millis(10)))
        .with(pool.clone())
        .with(Typed::json())
        .with(BearerAuth::new("s3cret").unwrap())
        .build();

    for _ in 0..30 {
        let response = RequestBuilder::post("orders")
            .json(&serde_json::json!({"item": "widget"}))
            .send(&client)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["id"], 42);
    }

    let mut total = 0;
    for server in &servers {
        total += server.received_requests().await.unwrap().len();
    }
    assert_eq!(total, 30);
    assert!(pool.pool().stats().iter().all(|s| !s.dead));
}

#[tokio::test]
async fn test_null_stack_never_reaches_network() {
    let client = decorate(
        transport(),
        [
            Box::new(Logged::new()) as Box<dyn Decorator>,
            Box::new(Scoped::new("http://127.0.0.1:1").unwrap()),
            Box::new(Null),
        ],
    );

    let response = RequestBuilder::get("/anything").send(&client).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    drain_close(Some(response)).await.unwrap();
}

#[tokio::test]
async fn test_server_errors_are_responses_not_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = Decorated::from_shared(transport())
        .with(FaultTolerant::new(5, Duration::ZERO))
        .with(Scoped::new(&server.uri()).unwrap())
        .build();

    let response = RequestBuilder::get("/").send(&client).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Metrics Tests
// =============================================================================

#[cfg(feature = "metrics")]
#[tokio::test]
async fn test_instrumented_pool() {
    use relay::relay_metrics::prometheus::Registry;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let registry = Registry::new();
    let instrumented = Instrumented::new("workflow", &registry).unwrap();
    let pool = StaticClientPool::new(
        vec![server.uri()],
        Duration::from_secs(60),
        LinearValueCalculator,
    )
    .unwrap();

    let client = Decorated::from_shared(transport())
        .with(instrumented.clone())
        .with(pool)
        .build();

    for _ in 0..5 {
        RequestBuilder::get("/").send(&client).await.unwrap();
    }

    let count = instrumented
        .requests_total()
        .with_label_values(&["get", "200"])
        .get();
    assert_eq!(count, 5.0);
    assert!(export_metrics(&registry).contains("http_client_requests_total"));
}
