use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use flexdb::{AppState, DataService, MemoryBackend, MemoryCatalog, SchemaService, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> axum::Router {
    let backend = Arc::new(MemoryBackend::new());
    let catalog = Arc::new(MemoryCatalog::new());
    let schema = SchemaService::new(backend.clone(), catalog.clone());
    let data = DataService::new(backend, catalog);
    build_router(AppState::new(schema, data))
}

async fn send_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    payload: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request should build");

    read_response(app, request).await
}

async fn send_empty(app: &axum::Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");

    read_response(app, request).await
}

async fn read_response(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    if body.is_empty() {
        return (status, Value::Null);
    }

    let json = serde_json::from_slice::<Value>(&body).expect("body should be valid JSON");
    (status, json)
}

fn demo_table() -> Value {
    json!({
        "name": "t_demo",
        "friendlyName": "Demo",
        "columns": [{"name": "note_x", "type": "TEXT", "nullable": false}]
    })
}

#[tokio::test]
async fn test_create_insert_read_update_delete() {
    let app = app();

    let (status, body) = send_json(&app, Method::POST, "/api/tables", demo_table()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], json!("t_demo"));
    assert_eq!(body["friendlyName"], json!("Demo"));
    assert_eq!(body["columns"][0]["name"], json!("id"));
    assert_eq!(body["columns"][0]["primaryKey"], json!(true));
    assert_eq!(body["columns"][0]["physicalType"], json!("BIGSERIAL"));
    assert_eq!(body["columns"][1]["columnType"], json!("TEXT"));
    assert_eq!(body["columns"][1]["nullable"], json!(false));

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/tables/t_demo/rows",
        json!({"note_x": "hello"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 1, "note_x": "hello"}));

    let (status, body) = send_empty(&app, Method::GET, "/api/tables/t_demo/rows/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "note_x": "hello"}));

    let (status, body) = send_json(
        &app,
        Method::PUT,
        "/api/tables/t_demo/rows/1",
        json!({"note_x": "bye"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "note_x": "bye"}));

    let (status, body) = send_empty(&app, Method::GET, "/api/tables/t_demo/schema").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("t_demo"));
    assert!(body["createdAt"].is_string());

    let (status, body) = send_empty(&app, Method::DELETE, "/api/tables/t_demo/rows/1").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send_empty(&app, Method::GET, "/api/tables/t_demo/rows/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_error_body_shape() {
    let app = app();

    let (status, body) = send_empty(&app, Method::GET, "/api/tables/t_ghost/schema").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], json!(404));
    assert_eq!(body["error"], json!("Not Found"));
    assert_eq!(body["path"], json!("/api/tables/t_ghost/schema"));
    assert!(body["timestamp"].is_string());
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("'t_ghost' not found")
    );
}

#[tokio::test]
async fn test_duplicate_table_is_conflict() {
    let app = app();

    let (status, _) = send_json(&app, Method::POST, "/api/tables", demo_table()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&app, Method::POST, "/api/tables", demo_table()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], json!(409));
    assert_eq!(body["error"], json!("Conflict"));
    assert!(body["message"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_validation_problems_are_bad_request() {
    let app = app();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/tables",
        json!({"name": "   ", "columns": [{"name": "a_x", "type": "TEXT"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("table name must not be blank"));

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/tables",
        json!({"name": "t_demo", "columns": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("at least one column is required"));

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/tables",
        json!({"name": "t_geo", "columns": [{"name": "loc_x", "type": "POINT"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Unsupported"));

    // Row-level validation surfaces the same way
    send_json(&app, Method::POST, "/api/tables", demo_table()).await;
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/tables/t_demo/rows",
        json!({"note_x": 7}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Type mismatch"));

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/tables/t_missing/rows",
        json!({"note_x": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_row_listing_defaults_and_clamping() {
    let app = app();
    send_json(&app, Method::POST, "/api/tables", demo_table()).await;

    for i in 0..25 {
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/tables/t_demo/rows",
            json!({"note_x": format!("row {i}")}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // No params: page 0 with the default size
    let (status, body) = send_empty(&app, Method::GET, "/api/tables/t_demo/rows").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], json!(0));
    assert_eq!(body["size"], json!(20));
    assert_eq!(body["content"].as_array().unwrap().len(), 20);
    assert_eq!(body["totalElements"], json!(25));
    assert_eq!(body["totalPages"], json!(2));
    assert_eq!(body["first"], json!(true));
    assert_eq!(body["last"], json!(false));

    let (status, body) =
        send_empty(&app, Method::GET, "/api/tables/t_demo/rows?page=1&size=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"].as_array().unwrap().len(), 10);
    assert_eq!(body["content"][0]["id"], json!(11));

    let (status, body) = send_empty(&app, Method::GET, "/api/tables/t_demo/rows?size=1000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], json!(100));
    assert_eq!(body["content"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_table_listing() {
    let app = app();

    let (status, body) = send_empty(&app, Method::GET, "/api/tables").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    send_json(&app, Method::POST, "/api/tables", demo_table()).await;

    let (status, body) = send_empty(&app, Method::GET, "/api/tables").await;
    assert_eq!(status, StatusCode::OK);
    let summaries = body.as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["name"], json!("t_demo"));
    assert_eq!(summaries[0]["friendlyName"], json!("Demo"));
    assert_eq!(summaries[0]["columnCount"], json!(2));
}
