//! End-to-end tests for the assembled router: staff auth, registration,
//! StoreHub sync, manual recovery, and the batch endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mportal_api::state::{AppConfig, AppState};
use mportal_storehub::{StoreHubClient, StoreHubConfig};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

const STAFF_SECRET: &str = "staff-secret";
const CRON_SECRET: &str = "cron-secret";

// -- Helpers ------------------------------------------------------------------

fn staff_token() -> String {
    format!("Bearer {}:{}", uuid::Uuid::new_v4(), STAFF_SECRET)
}

fn app_for(storehub_url: &str) -> Router {
    let config = AppConfig {
        port: 0,
        auth_token: Some(Zeroizing::new(STAFF_SECRET.to_string())),
        automation_secret: Some(Zeroizing::new(CRON_SECRET.to_string())),
    };
    let client = StoreHubClient::new(
        StoreHubConfig::local_mock(storehub_url, "user", "pass").expect("mock config"),
    )
    .expect("client");
    mportal_api::app(AppState::with_config(config, Some(client), None))
}

async fn mount_storehub(server: &MockServer, status: u16, body: &str) {
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/customers"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn staff_post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", staff_token())
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn staff_get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .uri(uri)
        .header("authorization", staff_token())
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

async fn batch(app: &Router, secret: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/storehub/retry")
        .header("authorization", format!("Bearer {secret}"))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

fn member(passport: &str) -> Value {
    json!({
        "passport_number": passport,
        "first_name": "Ana",
        "last_name": "Lim",
        "date_of_birth": "1990-05-01",
        "nationality": "Thai"
    })
}

async fn register(app: &Router, passport: &str) -> Value {
    let (status, body) = staff_post(app, "/v1/registrations", member(passport)).await;
    assert_eq!(status, StatusCode::CREATED, "registration body: {body}");
    body
}

async fn call_logs(app: &Router, id: &str) -> Vec<Value> {
    let (status, body) = staff_get(app, &format!("/v1/submissions/{id}/call-logs")).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].as_array().cloned().unwrap_or_default()
}

async fn submission(app: &Router, id: &str) -> Value {
    let (status, body) = staff_get(app, &format!("/v1/submissions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

// -- Probes and auth ----------------------------------------------------------

#[tokio::test]
async fn liveness_is_open() {
    let app = mportal_api::app(AppState::new());
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn staff_routes_require_token() {
    let server = MockServer::start().await;
    let app = app_for(&server.uri());
    let req = Request::builder()
        .uri("/v1/submissions/failed")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn registration_without_actor_rejected() {
    let server = MockServer::start().await;
    let app = app_for(&server.uri());
    let req = Request::builder()
        .method("POST")
        .uri("/v1/registrations")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {STAFF_SECRET}"))
        .body(Body::from(member("A1234567").to_string()))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// -- Registration -------------------------------------------------------------

#[tokio::test]
async fn registration_syncs_and_rejects_duplicates() {
    let server = MockServer::start().await;
    mount_storehub(&server, 201, r#"{"refId":"ok"}"#).await;
    let app = app_for(&server.uri());

    let body = register(&app, "a1234567 ").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["passport_number"], "A1234567");
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["retry_count"], 0);
    assert!(body["data"]["storehub_synced_at"].is_string());

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let logs = call_logs(&app, &id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["request_type"], "create");
    assert_eq!(logs[0]["response_status"], 201);
    assert_eq!(logs[0]["success"], true);

    let (status, body) = staff_post(&app, "/v1/registrations", member("A-1234567")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["details"]["fields"]["passport_number"].is_string());
}

#[tokio::test]
async fn registration_reports_every_invalid_field() {
    let server = MockServer::start().await;
    let app = app_for(&server.uri());
    let (status, body) = staff_post(
        &app,
        "/v1/registrations",
        json!({
            "passport_number": "A12",
            "first_name": "",
            "last_name": "Lim",
            "date_of_birth": "2020-01-01",
            "nationality": "Thai"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = &body["error"]["details"]["fields"];
    assert!(fields["passport_number"].is_string());
    assert!(fields["first_name"].is_string());
    assert!(fields["date_of_birth"].is_string());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn passport_check_reports_availability() {
    let server = MockServer::start().await;
    mount_storehub(&server, 201, "{}").await;
    let app = app_for(&server.uri());

    let (_, before) = staff_post(
        &app,
        "/v1/registrations/check",
        json!({ "passport_number": "b 7654321" }),
    )
    .await;
    assert_eq!(before["available"], true);
    assert_eq!(before["normalized_passport"], "B7654321");

    let registered = register(&app, "B7654321").await;
    let (_, after) = staff_post(
        &app,
        "/v1/registrations/check",
        json!({ "passport_number": "B7654321" }),
    )
    .await;
    assert_eq!(after["available"], false);
    assert_eq!(after["ref_id"], registered["data"]["ref_id"]);
}

// -- Failure and recovery -----------------------------------------------------

#[tokio::test]
async fn failed_sync_keeps_submission_and_raw_body() {
    let server = MockServer::start().await;
    mount_storehub(&server, 502, "<html>Bad Gateway</html>").await;
    let app = app_for(&server.uri());

    let body = register(&app, "C1234567").await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "storehub_failed");
    assert_eq!(body["data"]["storehub_error"], "<html>Bad Gateway</html>");
    assert_eq!(body["sync"]["error"], "StoreHub API error: 502");

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let logs = call_logs(&app, &id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(
        logs[0]["response_body"],
        json!({ "raw": "<html>Bad Gateway</html>" })
    );

    let (_, failed) = staff_get(&app, "/v1/submissions/failed").await;
    assert_eq!(failed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_sync_logs_json_error_body_verbatim() {
    let server = MockServer::start().await;
    let raw = "{ \"error\" :  \"dup\",\n \"code\": 7 }";
    mount_storehub(&server, 409, raw).await;
    let app = app_for(&server.uri());

    let body = register(&app, "C7654321").await;
    assert_eq!(body["data"]["storehub_error"], raw);

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let logs = call_logs(&app, &id).await;
    assert_eq!(logs[0]["error_message"], raw);
    assert_eq!(logs[0]["response_body"], json!({ "error": "dup", "code": 7 }));
}

#[tokio::test]
async fn manual_retry_failure_returns_raw_details() {
    let server = MockServer::start().await;
    mount_storehub(&server, 502, "<html>bad gateway</html>").await;
    let app = app_for(&server.uri());
    let id = register(&app, "C1112223").await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let raw = "{\n  \"message\": \"still down\"\n}";
    mount_storehub(&server, 503, raw).await;
    let (status, body) = staff_post(
        &app,
        "/api/storehub/manual-retry",
        json!({ "submissionId": id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "StoreHub API error: 503");
    assert_eq!(body["details"], raw);
}

#[tokio::test]
async fn manual_retry_recovers_failed_submission() {
    let server = MockServer::start().await;
    mount_storehub(&server, 500, r#"{"message":"down"}"#).await;
    let app = app_for(&server.uri());
    let id = register(&app, "D1234567").await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    mount_storehub(&server, 201, "{}").await;
    let (status, body) = staff_post(
        &app,
        "/api/storehub/manual-retry",
        json!({ "submissionId": id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let record = submission(&app, &id).await;
    assert_eq!(record["status"], "success");
    assert_eq!(record["retry_count"], 1);
    assert!(record["storehub_error"].is_null());

    let logs = call_logs(&app, &id).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1]["request_type"], "retry");
    assert!(logs[1]["created_by"].is_string());
}

#[tokio::test]
async fn retry_on_synced_submission_conflicts_without_side_effects() {
    let server = MockServer::start().await;
    mount_storehub(&server, 201, "{}").await;
    let app = app_for(&server.uri());
    let id = register(&app, "E1234567").await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = staff_post(
        &app,
        "/api/storehub/manual-retry",
        json!({ "submissionId": id }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Can only retry failed submissions");

    let record = submission(&app, &id).await;
    assert_eq!(record["status"], "success");
    assert_eq!(record["retry_count"], 0);
    assert_eq!(call_logs(&app, &id).await.len(), 1);
}

#[tokio::test]
async fn cancel_makes_no_storehub_call() {
    let server = MockServer::start().await;
    mount_storehub(&server, 500, "down").await;
    let app = app_for(&server.uri());
    let id = register(&app, "F1234567").await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let calls_before = server.received_requests().await.unwrap_or_default().len();

    let (status, body) =
        staff_post(&app, "/api/storehub/cancel", json!({ "submissionId": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Submission cancelled successfully");

    let record = submission(&app, &id).await;
    assert_eq!(record["status"], "cancelled");
    assert_eq!(call_logs(&app, &id).await.len(), 1);
    assert_eq!(
        server.received_requests().await.unwrap_or_default().len(),
        calls_before
    );

    let (status, _) =
        staff_post(&app, "/api/storehub/cancel", json!({ "submissionId": id })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn missing_submission_id_is_validation_error() {
    let server = MockServer::start().await;
    let app = app_for(&server.uri());
    let (status, body) = staff_post(&app, "/api/storehub/manual-retry", json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn transport_failure_logs_null_status() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let app = app_for(&format!("http://127.0.0.1:{port}"));

    let body = register(&app, "G1234567").await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "storehub_failed");

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let logs = call_logs(&app, &id).await;
    assert_eq!(logs.len(), 1);
    assert!(logs[0]["response_status"].is_null());
    assert!(logs[0]["error_message"].is_string());
}

// -- Batch recovery -----------------------------------------------------------

#[tokio::test]
async fn batch_rejects_wrong_secret() {
    let server = MockServer::start().await;
    let app = app_for(&server.uri());
    let (status, _) = batch(&app, "not-the-secret").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn batch_processes_oldest_ten() {
    let server = MockServer::start().await;
    mount_storehub(&server, 500, "down").await;
    let app = app_for(&server.uri());

    let mut ids = Vec::new();
    for n in 0..12 {
        let body = register(&app, &format!("H{n:07}")).await;
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    mount_storehub(&server, 201, "{}").await;
    let (status, body) = batch(&app, CRON_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!({ "total": 10, "succeeded": 10, "failed": 0 }));

    for id in &ids[..10] {
        assert_eq!(submission(&app, id).await["status"], "success");
    }
    for id in &ids[10..] {
        assert_eq!(submission(&app, id).await["status"], "storehub_failed");
    }

    let logs = call_logs(&app, &ids[0]).await;
    assert_eq!(logs.len(), 2);
    assert!(logs[1]["created_by"].is_null());
}

#[tokio::test]
async fn batch_skips_submissions_at_retry_ceiling() {
    let server = MockServer::start().await;
    mount_storehub(&server, 500, "down").await;
    let app = app_for(&server.uri());
    let id = register(&app, "J1234567").await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    for _ in 0..5 {
        let (status, body) = staff_post(
            &app,
            "/api/storehub/manual-retry",
            json!({ "submissionId": id }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
    }
    assert_eq!(submission(&app, &id).await["retry_count"], 5);

    mount_storehub(&server, 201, "{}").await;
    let (_, body) = batch(&app, CRON_SECRET).await;
    assert_eq!(body["results"]["total"], 0);
    assert_eq!(submission(&app, &id).await["status"], "storehub_failed");
}
