use assert_matches::assert_matches;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn sends_api_key_and_decodes_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let rows: Vec<Value> = client
        .request(Method::GET, "/rest/v1/appointments?doctor_id=eq.7", None)
        .await
        .expect("request should succeed");

    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn conditional_write_with_no_match_returns_empty() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", "is.null"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let rows = client
        .write_returning(
            Method::PATCH,
            "/rest/v1/appointments?id=eq.abc&patient_id=is.null",
            json!({ "patient_id": 42 }),
        )
        .await
        .expect("request should succeed");

    assert!(rows.is_empty());
}

#[tokio::test]
async fn conflict_status_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let err = client
        .write_returning(Method::POST, "/rest/v1/appointments", json!({}))
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(!err.is_not_found());
    assert_matches!(err, SupabaseError::Api { status: StatusCode::CONFLICT, .. });
}
