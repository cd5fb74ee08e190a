use assert_matches::assert_matches;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::error::AppError;

async fn client_for(server: &MockServer) -> BackendClient {
    BackendClient::new(&PortalConfig::new(&format!("{}/api", server.uri())))
}

#[tokio::test]
async fn sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/my-appointments/"))
        .and(header("authorization", "Bearer abc.def.ghi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let rows: Vec<Value> = client.get("my-appointments/", Some("abc.def.ghi")).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn maps_error_body_into_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/book-appointment/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "This appointment slot is already taken."
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result: Result<Value, AppError> = client
        .post("book-appointment/", &json!({"doctor_id": 1}), Some("t"))
        .await;

    assert_matches!(
        result,
        Err(AppError::Backend { status: 400, message: Some(ref m) }) if m == "This appointment slot is already taken."
    );
}

#[tokio::test]
async fn passes_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/available-slots/"))
        .and(query_param("doctor_id", "3"))
        .and(query_param("date", "2024-06-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "time": "09:00:00"}])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let slots: Vec<Value> = client
        .get_with_query("available-slots/", &[("doctor_id", "3"), ("date", "2024-06-10")], None)
        .await
        .unwrap();
    assert_eq!(slots.len(), 1);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let client = BackendClient::new(&PortalConfig::new("http://127.0.0.1:1/api"));
    let result: Result<Value, AppError> = client.get("doctors/", None).await;
    assert_matches!(result, Err(AppError::Transport(_)));
}
