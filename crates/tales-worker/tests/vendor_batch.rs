//! End-to-end batch against a mock vendor API.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tales_models::{Outcome, Vendor};
use tales_poller::{JobLimiter, JobPoller, JobStore, PollConfig};
use tales_vendors::{VendorClient, VendorConfig};
use tales_worker::{with_fallback, BatchItem, BatchRunner};

async fn mount_task(server: &MockServer, id: &str, final_body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/tasks/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": id, "status": "RUNNING"})))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/tasks/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(final_body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_runway_batch_meets_threshold_with_fallback() {
    let server = MockServer::start().await;

    for i in 0..5 {
        let id = format!("task-{}", i);
        Mock::given(method("POST"))
            .and(path("/v1/image_to_video"))
            .and(wiremock::matchers::body_json(json!({"scene": i})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": id})))
            .mount(&server)
            .await;
    }

    for i in 0..4 {
        let id = format!("task-{}", i);
        let url = format!("https://cdn.example/scene-{}.mp4", i);
        mount_task(&server, &id, json!({"id": id, "status": "SUCCEEDED", "output": [url]})).await;
    }
    mount_task(
        &server,
        "task-4",
        json!({"id": "task-4", "status": "FAILED", "failure": "Content moderated"}),
    )
    .await;

    let config = VendorConfig::new(Vendor::Runway, "test-key")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5));
    let client = VendorClient::new(config).unwrap();

    let store = JobStore::new();
    let poller = JobPoller::new(
        PollConfig::new(Duration::from_millis(10), Duration::from_secs(10)).unwrap(),
    )
    .with_store(store.clone())
    .with_label("runway");
    let runner = BatchRunner::new(Vendor::Runway, JobLimiter::for_vendor(Vendor::Runway), poller);

    let submissions = (0..5).map(|i| {
        let client = &client;
        move || async move {
            client
                .submit("/v1/image_to_video", &json!({"scene": i}))
                .await
        }
    });

    let report = runner.submit_all(submissions, &client).await;

    assert_eq!(report.len(), 5);
    assert_eq!(report.success_ratio(), 0.8);
    assert!(report.meets_threshold(0.8));
    assert_eq!(
        report.first_success(),
        Some(&json!("https://cdn.example/scene-0.mp4"))
    );
    assert_eq!(report.failures(), vec![&"Content moderated".to_string()]);
    assert_eq!(runner.limiter().in_flight(), 0);

    // Every job reached a terminal state in the shared store.
    assert_eq!(store.len().await, 5);
    assert!(store.active().await.is_empty());

    let last = match report.items()[4].clone() {
        BatchItem::Finished { outcome, .. } => outcome,
        BatchItem::SubmitFailed { .. } => Outcome::TimedOut,
    };
    let fallback = report.first_success().cloned().unwrap_or(Value::Null);
    assert_eq!(
        with_fallback(last, fallback),
        json!("https://cdn.example/scene-0.mp4")
    );
}
