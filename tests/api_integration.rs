//! Integration tests for the HTTP API
//!
//! Tests session lifecycle and the command relay endpoint end to end: a
//! command posted over HTTP must show up in authority state after the
//! session's background tick loop has run.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

use griplock::core::create_router;

fn create_test_router() -> axum::Router {
    create_router(60.0)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_session(app: &axum::Router, body: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/session/new")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_create_session_with_defaults() {
    let app = create_test_router();

    let response = create_session(&app, "{}").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["session_id"].is_string());
    assert!(json["command_url"].as_str().unwrap().ends_with("/command"));
    assert!(json["websocket_url"].is_string());
}

#[tokio::test]
async fn test_create_session_rejects_invalid_config() {
    let app = create_test_router();

    let body = json!({ "config": { "squeeze_ratio": 1.5 } }).to_string();
    let response = create_session(&app, &body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_session_not_found() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/session/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_command_for_unknown_session_is_404() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/session/nonexistent/command")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"kind":"engaged","side":"A"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_relayed_commands_reach_authority_state() {
    let app = create_test_router();

    let created = body_json(create_session(&app, "{}").await).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    // Relay an engage + position for side A
    for body in [
        r#"{"kind":"engaged","side":"A"}"#.to_string(),
        r#"{"kind":"position","side":"A","position":{"x":0.1,"y":0.2,"z":0.3}}"#.to_string(),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/session/{}/command", id))
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["queued"], true);
    }

    // Give the background tick loop time to drain the queue
    tokio::time::sleep(Duration::from_millis(150)).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/session/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status = body_json(response).await;
    assert_eq!(status["engaged_a"], true);
    assert_eq!(status["engaged_b"], false);
    assert_eq!(status["trigger_count"], 0);
    // One engaged side alone never establishes a baseline
    assert!(status["rest_distance"].is_null());
}

#[tokio::test]
async fn test_delete_session_closes_the_lifecycle() {
    let app = create_test_router();

    let created = body_json(create_session(&app, "{}").await).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/session/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["session_id"], id.as_str());

    // Gone from status, commands, and repeat deletes alike
    for (method, uri) in [
        ("GET", format!("/session/{}", id)),
        ("DELETE", format!("/session/{}", id)),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // The health count reflects the removal
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["sessions_active"], 0);
}

#[tokio::test]
async fn test_status_reports_session_config() {
    let app = create_test_router();

    let body = json!({ "config": { "squeeze_ratio": 0.6, "cooldown": 2.0 } }).to_string();
    let created = body_json(create_session(&app, &body).await).await;
    let id = created["session_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/session/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = body_json(response).await;
    let ratio = status["config"]["squeeze_ratio"].as_f64().unwrap();
    assert!((ratio - 0.6).abs() < 1e-6);
    let cooldown = status["config"]["cooldown"].as_f64().unwrap();
    assert!((cooldown - 2.0).abs() < 1e-6);
}
