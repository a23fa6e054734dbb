//! Tests for the vendor HTTP client against a mock vendor API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tales_models::{JobId, Outcome, StatusSample, Vendor};
use tales_poller::{JobPoller, PollConfig, StatusCheck};

use crate::client::{VendorClient, RUNWAY_API_VERSION};
use crate::config::VendorConfig;
use crate::error::VendorError;

// =============================================================================
// Test Helpers
// =============================================================================

fn client(vendor: Vendor, server: &MockServer) -> VendorClient {
    let config = VendorConfig::new(vendor, "test-key")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5));
    VendorClient::new(config).unwrap()
}

fn fast_poller(max_wait: Duration) -> JobPoller {
    JobPoller::new(PollConfig::new(Duration::from_millis(10), max_wait).unwrap()).with_label("test")
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submit_returns_vendor_job_id() {
    let server = MockServer::start().await;
    let request = json!({"promptText": "a fox in the snow", "duration": 5});

    Mock::given(method("POST"))
        .and(path("/v1/image_to_video"))
        .and(header("Authorization", "Bearer test-key"))
        .and(header("X-Runway-Version", RUNWAY_API_VERSION))
        .and(body_json(&request))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "task-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = client(Vendor::Runway, &server)
        .submit("/v1/image_to_video", &request)
        .await
        .unwrap();

    assert_eq!(job_id, JobId::from("task-1"));
}

#[tokio::test]
async fn test_submit_rejected_by_vendor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let err = client(Vendor::Sora, &server)
        .submit("v1/videos", &json!({"prompt": "x"}))
        .await
        .unwrap_err();

    assert!(matches!(err, VendorError::Http { status: 401, ref body } if body == "invalid key"));
    assert!(!err.is_retryable());
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_fal_uses_key_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/requests/req-1/status"))
        .and(header("Authorization", "Key test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "IN_QUEUE"})))
        .expect(1)
        .mount(&server)
        .await;

    let sample = client(Vendor::Fal, &server)
        .fetch_status(&JobId::from("req-1"))
        .await
        .unwrap();
    assert_eq!(sample, StatusSample::Running);
}

#[tokio::test]
async fn test_goapi_uses_api_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/task/t-9"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"status": "completed", "output": {"audio_url": "https://cdn/song.mp3"}}
        })))
        .mount(&server)
        .await;

    let sample = client(Vendor::GoApi, &server)
        .fetch_status(&JobId::from("t-9"))
        .await
        .unwrap();
    assert_eq!(
        sample,
        StatusSample::Completed(json!({"audio_url": "https://cdn/song.mp3"}))
    );
}

// =============================================================================
// Status Checks
// =============================================================================

#[tokio::test]
async fn test_suno_status_uses_query_parameter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/generate/record-info"))
        .and(query_param("taskId", "suno-1"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {"status": "SENSITIVE_WORD_ERROR", "errorMessage": "prompt rejected"}
        })))
        .mount(&server)
        .await;

    let sample = client(Vendor::Suno, &server)
        .check_status(&JobId::from("suno-1"))
        .await
        .unwrap();
    assert_eq!(sample, StatusSample::Failed("prompt rejected".to_string()));
}

#[tokio::test]
async fn test_status_errors_are_typed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/tasks/limited"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let runway = client(Vendor::Runway, &server);

    let limited = runway.fetch_status(&JobId::from("limited")).await.unwrap_err();
    assert!(matches!(limited, VendorError::RateLimited(_)));

    let garbled = runway.fetch_status(&JobId::from("garbled")).await.unwrap_err();
    assert!(matches!(garbled, VendorError::Json(_)));
    assert!(garbled.is_retryable());
}

// =============================================================================
// Polling End To End
// =============================================================================

#[tokio::test]
async fn test_poll_until_vendor_completes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/predictions/ws-1/result"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"status": "processing"}})),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/predictions/ws-1/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"status": "completed", "outputs": ["https://cdn/clip.mp4"]}
        })))
        .mount(&server)
        .await;

    let wavespeed = client(Vendor::Wavespeed, &server);
    let outcome = fast_poller(Duration::from_secs(10))
        .await_completion(&JobId::from("ws-1"), &wavespeed)
        .await;

    assert_eq!(outcome, Outcome::Success(json!("https://cdn/clip.mp4")));
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_poll_survives_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/video_7"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/videos/video_7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_7",
            "status": "failed",
            "error": {"message": "moderation_blocked"}
        })))
        .mount(&server)
        .await;

    let sora = client(Vendor::Sora, &server);
    let outcome = fast_poller(Duration::from_secs(10))
        .await_completion(&JobId::from("video_7"), &sora)
        .await;

    assert_eq!(outcome, Outcome::Failure("moderation_blocked".to_string()));
}

#[tokio::test]
async fn test_poll_times_out_on_missing_job() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let runway = client(Vendor::Runway, &server);
    let outcome = fast_poller(Duration::from_millis(100))
        .await_completion(&JobId::from("ghost"), &runway)
        .await;

    assert!(outcome.is_timed_out());
}
