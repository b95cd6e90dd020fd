//! Integration tests for the HTTP routes: health, lobby listing and
//! request ids.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt; // For `oneshot` method
use truco::game::{GameKind, Username};
use truco::room::{RoomConfig, RoomManager};
use truco_server::api::{self, AppState, request_id::REQUEST_ID_HEADER};
use uuid::Uuid;

fn create_test_server(max_rooms: usize) -> (axum::Router, RoomManager) {
    let manager = RoomManager::new(RoomConfig::default(), max_rooms);
    let app = api::create_router(AppState::new(manager.clone()));
    (app, manager)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server(10);
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["rooms"]["active_count"], 0);
    assert_eq!(body["rooms"]["limit"], 10);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_reports_full_server() {
    let (app, manager) = create_test_server(1);
    manager.create_room(GameKind::War, None).await.unwrap();

    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["rooms"]["active_count"], 1);
}

// ============================================================================
// Room Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_rooms_starts_empty() {
    let (app, _) = create_test_server(10);
    let (status, body) = get(app, "/api/v1/rooms").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn test_list_and_get_room() {
    let (app, manager) = create_test_server(10);
    let (tx, _rx) = mpsc::channel(64);
    manager
        .create_and_join(GameKind::Truco, Some("mesa1"), Uuid::new_v4(), Username::new("ana"), tx)
        .await
        .unwrap();

    let (status, body) = get(app.clone(), "/api/v1/rooms").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["code"], "MESA1");
    assert_eq!(body[0]["game"], "truco");
    assert_eq!(body[0]["capacity"], 4);

    let (status, body) = get(app, "/api/v1/rooms/mesa1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "MESA1");
    assert_eq!(body["humans"], 1);
    assert_eq!(body["started"], false);
}

#[tokio::test]
async fn test_unknown_room_is_404() {
    let (app, _) = create_test_server(10);
    let (status, body) = get(app, "/api/v1/rooms/NOPE42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("NOPE42"));
}

// ============================================================================
// Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (app, _) = create_test_server(10);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_failed_room_lookup_echoes_client_request_id() {
    let (app, _) = create_test_server(10);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/rooms/NOPE42")
                .header(REQUEST_ID_HEADER, "lobby-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "lobby-7");
}

#[tokio::test]
async fn test_plain_get_on_ws_route_is_rejected() {
    let (app, _) = create_test_server(10);
    let (status, _) = get(app, "/ws").await;
    assert!(status.is_client_error());
}
