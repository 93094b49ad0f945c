//! API integration tests, driven in-process against the in-memory store

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use gtl_server::{
    api,
    config::{AppConfig, DatabaseConfig, LoggingConfig, ServerConfig, StorageBackend, StorageConfig},
    models::address::{Address, NewAddress},
    repository::{memory::MemoryStore, Repository},
    services::Services,
    AppState,
};

async fn app() -> (Router, MemoryStore) {
    let store = MemoryStore::with_default_vocabulary().await;
    let repository = Repository::in_memory(store.clone());
    let config = AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        storage: StorageConfig { backend: StorageBackend::Memory },
        logging: LoggingConfig::default(),
    };
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(Services::new(repository.clone())),
        repository,
    };
    (api::router(state), store)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri))
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Failed to send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, value)
}

async fn type_id(app: &Router, name: &str) -> i64 {
    let (_, types) = send(app, "GET", "/material-types", None).await;
    types
        .as_array()
        .expect("types array")
        .iter()
        .find(|t| t["name"] == name)
        .and_then(|t| t["id"].as_i64())
        .expect("type present")
}

async fn location(store: &MemoryStore, street: &str) -> Address {
    store
        .add_address(NewAddress {
            street: street.to_string(),
            zip_code: "8000".to_string(),
            city: "Aarhus".to_string(),
        })
        .await
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app().await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_vocabularies() {
    let (app, store) = app().await;
    store.add_subject("Poetry").await;

    let (status, types) = send(&app, "GET", "/material-types", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = types
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Book", "Journal", "Map", "Reference book", "Article"]);

    let (status, subjects) = send(&app, "GET", "/subjects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subjects[0]["name"], "Poetry");
}

#[tokio::test]
async fn test_material_lifecycle() {
    let (app, _) = app().await;
    let book = type_id(&app, "Book").await;

    let (status, created) = send(
        &app,
        "POST",
        "/materials",
        Some(json!({
            "isbn": "978-0441013593",
            "title": "Dune",
            "language": "en",
            "lendable": true,
            "type": { "id": book },
            "authors": [{ "first_name": "Frank", "last_name": "Herbert" }],
            "subjects": [{ "name": "Science fiction" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Dune");
    assert_eq!(created["type"]["name"], "Book");
    assert_eq!(created["authors"][0]["last_name"], "Herbert");
    assert_eq!(created["subjects"][0]["name"], "Science fiction");
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = send(&app, "GET", &format!("/materials/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/materials/{}", id),
        Some(json!({
            "isbn": "978-0441013593",
            "title": "Dune Messiah",
            "language": "en",
            "lendable": false,
            "type": { "id": book },
            "authors": [{ "id": created["authors"][0]["id"] }],
            "subjects": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["lendable"], false);
    assert_eq!(updated["authors"], created["authors"]);
    assert_eq!(updated["subjects"], json!([]));

    let (status, list) = send(&app, "GET", "/materials", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/materials/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/materials/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchData");
}

#[tokio::test]
async fn test_create_material_rejects_invalid_input() {
    let (app, store) = app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/materials",
        Some(json!({ "title": "No type here" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/materials",
        Some(json!({ "title": "Lost", "type": { "id": 9999 } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(store.counts().await.materials, 0);
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let (app, store) = app().await;
    let book = type_id(&app, "Book").await;

    let (status, body) = send(
        &app,
        "POST",
        "/materials",
        Some(json!({ "title": "X", "type": { "name": "Book" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = send(
        &app,
        "POST",
        "/materials",
        Some(json!({ "title": "X", "type": { "id": book }, "authors": [{ "id": "abc" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, _) = send(
        &app,
        "POST",
        "/volumes",
        Some(json!({ "material_id": "one", "home_location_id": 1, "current_location_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(store.counts().await.materials, 0);
}

#[tokio::test]
async fn test_oversized_title_is_a_validation_error() {
    let (app, store) = app().await;
    let book = type_id(&app, "Book").await;

    let (status, body) = send(
        &app,
        "POST",
        "/materials",
        Some(json!({ "title": "x".repeat(600), "type": { "id": book } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert_eq!(store.counts().await.materials, 0);
}

#[tokio::test]
async fn test_update_missing_material_is_not_found() {
    let (app, _) = app().await;
    let book = type_id(&app, "Book").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/materials/4321",
        Some(json!({ "title": "Ghost", "type": { "id": book } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_volumes_guard_material_delete() {
    let (app, store) = app().await;
    let map = type_id(&app, "Map").await;
    let shelf = location(&store, "Map room").await;
    let desk = location(&store, "Front desk").await;

    let (_, material) = send(
        &app,
        "POST",
        "/materials",
        Some(json!({ "title": "Atlas of Denmark", "type": { "id": map } })),
    )
    .await;
    let material_id = material["id"].as_i64().unwrap();

    let (status, volume) = send(
        &app,
        "POST",
        "/volumes",
        Some(json!({
            "material_id": material_id,
            "home_location_id": shelf.id,
            "current_location_id": desk.id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(volume["material"]["id"], material_id);
    assert_eq!(volume["home_location"]["street"], "Map room");
    assert_eq!(volume["current_location"]["street"], "Front desk");

    let (status, volumes) = send(&app, "GET", &format!("/materials/{}/volumes", material_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(volumes, json!([volume]));

    let (status, body) = send(&app, "DELETE", &format!("/materials/{}", material_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "MaterialHasVolumes");

    let (status, _) = send(&app, "GET", &format!("/materials/{}", material_id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_volume_with_unknown_location_is_not_created() {
    let (app, store) = app().await;
    let book = type_id(&app, "Book").await;
    let shelf = location(&store, "Shelf 3").await;

    let (_, material) = send(
        &app,
        "POST",
        "/materials",
        Some(json!({ "title": "Emma", "type": { "id": book } })),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/volumes",
        Some(json!({
            "material_id": material["id"],
            "home_location_id": shelf.id,
            "current_location_id": 9999
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, volumes) = send(&app, "GET", "/volumes", None).await;
    assert_eq!(volumes, json!([]));
}

#[tokio::test]
async fn test_volume_update_and_delete_are_not_implemented() {
    let (app, _) = app().await;

    let (status, _) = send(
        &app,
        "PUT",
        "/volumes/1",
        Some(json!({ "material_id": 1, "home_location_id": 1, "current_location_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

    let (status, body) = send(&app, "DELETE", "/volumes/1", None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["error"], "NotImplemented");
}
