//! File upload handshake tests against a wiremock Canvas server.

use bytes::Bytes;
use canvasapi::{upload_file, CanvasClient, CanvasError, FileUpload};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CanvasClient {
    CanvasClient::with_base_url(&format!("{}/api/v1", server.uri()), "test-token").unwrap()
}

fn sample_upload() -> FileUpload {
    FileUpload::new(
        "report.pdf",
        "application/pdf",
        Bytes::from_static(b"%PDF-1.4 fake"),
    )
}

// =============================================================================
// Full three-step handshake
// =============================================================================

#[tokio::test]
async fn test_upload_runs_all_three_steps() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    // Step 1: negotiation carries the file metadata.
    Mock::given(method("POST"))
        .and(path("/api/v1/courses/1/files"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "name": "report.pdf",
            "size": 13,
            "content_type": "application/pdf",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "upload_url": format!("{}/storage/presigned", server.uri()),
            "upload_params": { "key": "abc123", "policy": "signed" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Step 2: the pre-signed target answers with a confirmation pointer.
    Mock::given(method("POST"))
        .and(path("/storage/presigned"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "location": format!("{}/api/v1/files/999", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Step 3: confirmation must carry the bearer token again.
    Mock::given(method("GET"))
        .and(path("/api/v1/files/999"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 999,
            "display_name": "report.pdf",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = upload_file(&client, "/courses/1/files", sample_upload())
        .await
        .unwrap();

    assert_eq!(file["id"], json!(999));
    assert_eq!(file["display_name"], json!("report.pdf"));
}

#[tokio::test]
async fn test_upload_without_location_skips_confirmation() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/api/v1/courses/1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "upload_url": format!("{}/storage/presigned", server.uri()),
            "upload_params": { "key": "abc123" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The storage target returns the file record inline; only 2 calls total.
    Mock::given(method("POST"))
        .and(path("/storage/presigned"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1000,
            "display_name": "report.pdf",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = upload_file(&client, "/courses/1/files", sample_upload())
        .await
        .unwrap();

    assert_eq!(file["id"], json!(1000));
}

#[tokio::test]
async fn test_upload_forwards_additional_params() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let mut upload = sample_upload();
    upload
        .additional_params
        .insert("parent_folder_id".to_string(), json!("17"));
    upload
        .additional_params
        .insert("on_duplicate".to_string(), json!("rename"));

    Mock::given(method("POST"))
        .and(path("/api/v1/courses/1/files"))
        .and(body_partial_json(json!({
            "parent_folder_id": "17",
            "on_duplicate": "rename",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "upload_url": format!("{}/storage/presigned", server.uri()),
            "upload_params": {},
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/storage/presigned"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let file = upload_file(&client, "/courses/1/files", upload).await.unwrap();
    assert_eq!(file["id"], json!(7));
}

// =============================================================================
// Failure modes
// =============================================================================

#[tokio::test]
async fn test_negotiation_error_carries_field_message() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/api/v1/courses/1/files"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": { "name": [{ "message": "Name is required" }] },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = upload_file(&client, "/courses/1/files", sample_upload())
        .await
        .unwrap_err();

    match err {
        CanvasError::Api {
            message,
            status_code,
        } => {
            assert!(message.contains("name: Name is required"), "{message}");
            assert_eq!(status_code, Some(400));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_negotiation_without_target_is_rejected() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/api/v1/courses/1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let err = upload_file(&client, "/courses/1/files", sample_upload())
        .await
        .unwrap_err();

    assert!(matches!(err, CanvasError::UploadNegotiation(_)));
}

#[tokio::test]
async fn test_transfer_failure_is_normalized() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/api/v1/courses/1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "upload_url": format!("{}/storage/presigned", server.uri()),
            "upload_params": {},
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/storage/presigned"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "storage offline" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = upload_file(&client, "/courses/1/files", sample_upload())
        .await
        .unwrap_err();

    match err {
        CanvasError::Api {
            message,
            status_code,
        } => {
            assert_eq!(message, "storage offline");
            assert_eq!(status_code, Some(500));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
