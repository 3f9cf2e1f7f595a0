//! Backend API Integration Tests
//!
//! Tests for the Axum HTTP endpoints using Router::oneshot pattern.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use backend::{api, AppState};
use serde_json::{json, Value};
use shared::protocol::{TimeField, UiCommand, UiEvent};
use tokio::sync::{broadcast, mpsc};
use tower::ServiceExt;

/// Helper to create test router plus the coordinator end of its command channel
fn test_router() -> (Router, mpsc::UnboundedReceiver<UiCommand>) {
    let (commands, rx) = mpsc::unbounded_channel();
    let (events, _) = broadcast::channel::<UiEvent>(16);
    (api::router(AppState::new(commands, events)), rx)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_challenge_is_queued() {
    let (app, mut commands) = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/challenge")
                .header("content-type", "application/json")
                .body(Body::from(json!({"username": "maia1", "time": "180"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await, json!({"queued": true}));

    assert_eq!(
        commands.try_recv().unwrap(),
        UiCommand::Challenge {
            username: Some("maia1".to_string()),
            time: Some(TimeField::Text("180".to_string())),
        }
    );
}

#[tokio::test]
async fn test_challenge_with_empty_body_object() {
    let (app, mut commands) = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/challenge")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        commands.try_recv().unwrap(),
        UiCommand::Challenge {
            username: None,
            time: None
        }
    );
}

#[tokio::test]
async fn test_challenge_when_coordinator_gone() {
    let (app, commands) = test_router();
    drop(commands);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/challenge")
                .header("content-type", "application/json")
                .body(Body::from(json!({"username": "bob"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await, json!({"queued": false}));
}

#[tokio::test]
async fn test_challenge_rejects_malformed_json() {
    let (app, mut commands) = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/challenge")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(commands.try_recv().is_err());
}

#[tokio::test]
async fn test_health() {
    let (app, _commands) = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dashboards"], 0);
}

#[tokio::test]
async fn test_ws_route_requires_upgrade() {
    let (app, _commands) = test_router();

    let response = app
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
