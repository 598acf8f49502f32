//! Batch dispatch tests against a wiremock Canvas server.

use canvasapi::{ActionItem, CanvasClient, CanvasError, Dispatcher, Params, Resource};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CanvasClient {
    CanvasClient::with_base_url(&format!("{}/api/v1", server.uri()), "test-token").unwrap()
}

fn item(params: Value) -> ActionItem {
    match params {
        Value::Object(map) => ActionItem::new(map),
        _ => unreachable!(),
    }
}

// =============================================================================
// Batch ordering and flattening
// =============================================================================

#[tokio::test]
async fn test_records_preserve_item_order_and_index() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1/assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 11, "name": "essay" },
            { "id": 12, "name": "lab" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/2/assignments"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 21, "name": "quiz prep" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut dispatcher = Dispatcher::new(client_for(&server));
    let records = dispatcher
        .execute(
            Resource::Assignment,
            "getAll",
            vec![
                item(json!({ "courseId": "1", "returnAll": true })),
                item(json!({ "courseId": "2", "returnAll": true })),
            ],
        )
        .await
        .unwrap();

    // Array results are flattened to one record per element, in order,
    // each tagged with the producing item's index.
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].item, 0);
    assert_eq!(records[0].json["id"], json!(11));
    assert_eq!(records[1].item, 0);
    assert_eq!(records[1].json["id"], json!(12));
    assert_eq!(records[2].item, 1);
    assert_eq!(records[2].json["id"], json!(21));
}

#[tokio::test]
async fn test_single_result_yields_single_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "name": "Biology" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut dispatcher = Dispatcher::new(client_for(&server));
    let records = dispatcher
        .execute(
            Resource::Course,
            "get",
            vec![item(json!({ "courseId": "7" }))],
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].json["name"], json!("Biology"));
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_failure_aborts_with_item_index() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "course not found" })),
        )
        .mount(&server)
        .await;

    let mut dispatcher = Dispatcher::new(client_for(&server));
    let err = dispatcher
        .execute(
            Resource::Course,
            "get",
            vec![
                item(json!({ "courseId": "1" })),
                item(json!({ "courseId": "404" })),
                item(json!({ "courseId": "1" })),
            ],
        )
        .await
        .unwrap_err();

    match err {
        CanvasError::Item { index, source } => {
            assert_eq!(index, 1);
            assert!(source.to_string().contains("course not found"));
        }
        other => panic!("expected Item error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_continue_on_fail_emits_error_record_and_keeps_going() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "course not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut dispatcher = Dispatcher::new(client_for(&server)).continue_on_fail(true);
    let records = dispatcher
        .execute(
            Resource::Course,
            "get",
            vec![
                item(json!({ "courseId": "1" })),
                item(json!({ "courseId": "404" })),
                item(json!({ "courseId": "1" })),
            ],
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].item, 0);
    assert_eq!(records[1].item, 1);
    assert!(records[1].json["error"]
        .as_str()
        .unwrap()
        .contains("course not found"));
    assert_eq!(records[2].item, 2);
    assert_eq!(records[2].json["id"], json!(1));
}

#[tokio::test]
async fn test_missing_parameter_is_reported() {
    let server = MockServer::start().await;
    let mut dispatcher = Dispatcher::new(client_for(&server));

    let err = dispatcher
        .execute(Resource::Course, "get", vec![ActionItem::new(Params::new())])
        .await
        .unwrap_err();

    match err {
        CanvasError::Item { index, source } => {
            assert_eq!(index, 0);
            assert!(matches!(*source, CanvasError::MissingParameter("courseId")));
        }
        other => panic!("expected Item error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unsupported_operation_is_rejected() {
    let server = MockServer::start().await;
    let mut dispatcher = Dispatcher::new(client_for(&server));

    let err = dispatcher
        .execute(Resource::Quiz, "archive", vec![item(json!({}))])
        .await
        .unwrap_err();

    match err {
        CanvasError::Item { source, .. } => {
            assert!(matches!(
                *source,
                CanvasError::UnsupportedOperation { .. }
            ));
        }
        other => panic!("expected Item error, got {other:?}"),
    }
}

// =============================================================================
// Write operations build nested bodies
// =============================================================================

#[tokio::test]
async fn test_course_create_sends_nested_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/5/courses"))
        .and(body_partial_json(json!({
            "course[name]": "Intro to Rust",
            "course[course_code]": "RS-101",
            "course[start_at]": "2026-09-01T00:00:00.000Z",
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 301, "name": "Intro to Rust" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut dispatcher = Dispatcher::new(client_for(&server));
    let records = dispatcher
        .execute(
            Resource::Course,
            "create",
            vec![item(json!({
                "accountId": "5",
                "name": "Intro to Rust",
                "additionalFields": {
                    "course_code": "RS-101",
                    "startAt": "2026-09-01",
                },
            }))],
        )
        .await
        .unwrap();

    assert_eq!(records[0].json["id"], json!(301));
}

#[tokio::test]
async fn test_grade_update_sends_submission_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/courses/1/assignments/2/submissions/3"))
        .and(body_partial_json(json!({
            "submission[posted_grade]": "95",
            "submission[comment[text_comment]]": "Nice work",
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 88, "grade": "95", "score": 95.0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut dispatcher = Dispatcher::new(client_for(&server));
    let records = dispatcher
        .execute(
            Resource::Grade,
            "update",
            vec![item(json!({
                "courseId": "1",
                "assignmentId": "2",
                "studentId": "3",
                "grade": "95",
                "updateOptions": { "comment": "Nice work" },
            }))],
        )
        .await
        .unwrap();

    assert_eq!(records[0].json["grade"], json!("95"));
}

#[tokio::test]
async fn test_listing_without_return_all_caps_page_size() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1/assignments"))
        .and(query_param("per_page", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let mut dispatcher = Dispatcher::new(client_for(&server));
    let records = dispatcher
        .execute(
            Resource::Assignment,
            "getAll",
            vec![item(json!({ "courseId": "1", "limit": 5 }))],
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}
