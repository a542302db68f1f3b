//! HTTP surface checks that are decided before the database is touched

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{lazy_state, test_app};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

fn app() -> Router {
    test_app(lazy_state())
}

async fn send(app: Router, method: &str, uri: &str, body: &'static [u8]) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_profiles_listed() {
    let (status, json) = send(app(), "GET", "/profiles", b"").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["meta"]["total"], 5);
    let tags: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["document_type"].as_str().unwrap())
        .collect();
    assert!(tags.contains(&"price"));
    assert!(tags.contains(&"offers_mapping_table"));
}

#[tokio::test]
async fn test_upload_unknown_document_type() {
    let (status, json) = send(
        app(),
        "POST",
        "/uploads/invoices/march.csv?client_id=1",
        b"a,b\n1,2\n",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "UNKNOWN_DOCUMENT_TYPE");
}

#[tokio::test]
async fn test_upload_requires_client_id() {
    let (status, json) = send(
        app(),
        "POST",
        "/uploads/price/prices.csv?api_id=1",
        b"offer_id,price\nA1,1\n",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(
        json["error"]["message"],
        "Invalid request: missing required parameter client_id"
    );
}

#[tokio::test]
async fn test_upload_requires_profile_context() {
    let (status, json) = send(
        app(),
        "POST",
        "/uploads/price/prices.csv?client_id=1",
        b"offer_id,price\nA1,1\n",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"]["message"],
        "Invalid request: missing required parameter api_id"
    );
}

#[tokio::test]
async fn test_upload_rejects_unsupported_format_before_storing() {
    let (status, json) = send(
        app(),
        "POST",
        "/uploads/price/prices.pdf?client_id=1&api_id=1",
        b"%PDF-1.4",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "PARSE_ERROR");
}

#[tokio::test]
async fn test_preview_returns_rows() {
    let (status, json) = send(
        app(),
        "POST",
        "/uploads/price/prices.csv/preview?limit=1",
        b"offer_id,price\nA1,10.5\nA2,7\n",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["header"], serde_json::json!(["offer_id", "price"]));
    assert_eq!(json["data"]["rows"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["total_rows"], 2);
}

#[tokio::test]
async fn test_preview_reports_schema_error() {
    let (status, json) = send(
        app(),
        "POST",
        "/uploads/price/prices.csv/preview",
        b"offer_id,cost\nA1,10\n",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "SCHEMA_ERROR");
}

#[tokio::test]
async fn test_preview_rejects_bad_limit() {
    let (status, json) = send(
        app(),
        "POST",
        "/uploads/price/prices.csv/preview?limit=0",
        b"offer_id,price\nA1,10.5\n",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_file_list_requires_client_id() {
    let (status, json) = send(app(), "GET", "/client-files/", b"").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_file_upload_rejects_extension() {
    let (status, json) = send(app(), "POST", "/files/report.pdf?client_id=3", b"data").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_file_upload_rejects_empty_body() {
    let (status, _) = send(app(), "POST", "/templates/prices.xlsx", b"").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_file_upload_rejects_bad_client_id() {
    let (status, json) = send(app(), "POST", "/files/prices.csv?client_id=abc", b"x").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"]["message"],
        "Invalid request: parameter client_id has invalid value \"abc\""
    );
}

#[tokio::test]
async fn test_download_non_numeric_id_is_not_found() {
    let (status, json) = send(app(), "GET", "/files/latest", b"").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}
