//! Integration tests for relay-metrics

use prometheus::{HistogramOpts, Registry};
use relay_http_client::{Decorated, Decorator, Null, RequestBuilder, decorate};
use relay_metrics::*;
use std::sync::Arc;

fn base() -> relay_http_client::SharedClient {
    Arc::new(reqwest::Client::new())
}

#[tokio::test]
async fn test_instrumented_null_client() {
    let registry = Registry::new();
    let instrumented = Instrumented::new("null", &registry).unwrap();
    let client = Decorated::from_shared(base())
        .with(instrumented.clone())
        .with(Null)
        .build();

    for _ in 0..3 {
        RequestBuilder::get("http://example.invalid/")
            .send(&client)
            .await
            .unwrap();
    }
    RequestBuilder::post("http://example.invalid/")
        .body("payload")
        .send(&client)
        .await
        .unwrap();

    let requests = instrumented.requests_total();
    assert_eq!(requests.with_label_values(&["get", "204"]).get(), 3.0);
    assert_eq!(requests.with_label_values(&["post", "204"]).get(), 1.0);
    assert_eq!(instrumented.response_size().get_sample_sum(), 0.0);
    assert!(instrumented.request_size().get_sample_sum() > 0.0);
}

#[tokio::test]
async fn test_export_after_requests() {
    let registry = Registry::new();
    let instrumented = Instrumented::new("exported", &registry).unwrap();
    let client = decorate(
        base(),
        [
            Box::new(instrumented) as Box<dyn Decorator>,
            Box::new(Null),
        ],
    );

    RequestBuilder::head("http://example.invalid/")
        .send(&client)
        .await
        .unwrap();

    let text = export_metrics(&registry);
    assert!(text.contains("http_client_requests_total{code=\"204\",method=\"head\",name=\"exported\"} 1"));
}

#[test]
fn test_duration_histograms_need_their_own_subsystem() {
    let registry = Registry::new();
    Instrumented::new("svc", &registry).unwrap();

    let clash = InstrumentedRequestDurations::new(
        HistogramOpts::new("x", "x").subsystem("http_client"),
        &registry,
    );
    assert!(clash.is_err());

    let separate = InstrumentedRequestDurations::new(
        HistogramOpts::new("x", "x").subsystem("http_client_by_code"),
        &registry,
    );
    assert!(separate.is_ok());
}

#[tokio::test]
async fn test_request_durations_decorator() {
    let registry = Registry::new();
    let durations = InstrumentedRequestDurations::new(
        HistogramOpts::new("x", "x")
            .namespace("relay")
            .buckets(DEFAULT_DURATION_BUCKETS.to_vec()),
        &registry,
    )
    .unwrap();
    let client = durations.decorate(Null.decorate(base()));

    RequestBuilder::patch("http://example.invalid/")
        .send(&client)
        .await
        .unwrap();

    let histogram = durations.durations().with_label_values(&["patch", "204"]);
    assert_eq!(histogram.get_sample_count(), 1);
    assert!(export_metrics(&registry).contains("relay_request_duration_microseconds"));
}
