//! Client tests against a wiremock Canvas server.
//!
//! These cover the retry loop on the wire: which responses trigger a
//! retry under a `Limited` policy, and what surfaces when attempts run out.

use std::time::Duration;

use canvasapi::{CanvasClient, CanvasError, Params, RetryPolicy};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CanvasClient {
    CanvasClient::with_base_url(&format!("{}/api/v1", server.uri()), "test-token").unwrap()
}

#[tokio::test]
async fn test_limited_retry_recovers_from_rate_limit() {
    let server = MockServer::start().await;

    // First hit is throttled; the retry lands on the healthy mock.
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "message": "Rate limit exceeded" })),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "name": "Bio" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_retry_policy(RetryPolicy::Limited {
        attempts: 1,
        backoff: Duration::from_millis(1),
    });

    let value = client.get("/courses/1", &Params::new()).await.unwrap();
    assert_eq!(value["name"], json!("Bio"));
}

#[tokio::test]
async fn test_limited_retry_surfaces_error_when_attempts_run_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "message": "Service unavailable" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server).with_retry_policy(RetryPolicy::Limited {
        attempts: 1,
        backoff: Duration::from_millis(1),
    });

    let err = client.get("/courses/1", &Params::new()).await.unwrap_err();
    match err {
        CanvasError::Api {
            message,
            status_code,
        } => {
            assert_eq!(message, "Service unavailable");
            assert_eq!(status_code, Some(503));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_default_policy_fails_fast_on_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "message": "Rate limit exceeded" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get("/courses/1", &Params::new()).await.unwrap_err();
    match err {
        CanvasError::Api { status_code, .. } => assert_eq!(status_code, Some(429)),
        other => panic!("unexpected error: {other:?}"),
    }
}
