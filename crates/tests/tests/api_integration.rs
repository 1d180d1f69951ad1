use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use scout_api::build_app;
use serde_json::json;
use tower::ServiceExt;

/// Point every outbound lookup at a closed local port so provider calls
/// degrade deterministically instead of reaching the network.
fn route_lookups_to_closed_port() {
    std::env::set_var("SCOUT_GEOCODING_URL", "http://127.0.0.1:9/geo");
    std::env::set_var("SCOUT_WEATHER_URL", "http://127.0.0.1:9/weather");
    std::env::set_var("SCOUT_TIMEZONE_URL", "http://127.0.0.1:9/timezone");
    std::env::set_var("SCOUT_SUMMARY_URL", "http://127.0.0.1:9/summary");
}

fn chat_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-scout-key")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_requires_api_key() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "message": "Tokyo" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn trip_chat_returns_structured_payload_without_lookups() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({
            "message": "Help me plan a relaxed evening, any ideas?"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(parsed["responder"], "trip discussion responder");
    assert!(!parsed["response"].as_str().unwrap().is_empty());
    assert!(!parsed["reasoning"].as_str().unwrap().is_empty());
    assert_eq!(parsed["invocations"].as_array().unwrap().len(), 0);
    assert!(!parsed["session_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn place_chat_survives_unreachable_providers() {
    route_lookups_to_closed_port();
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({ "message": "Tokyo" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(parsed["responder"], "place summary responder");
    assert!(!parsed["response"].as_str().unwrap().is_empty());

    let tools: Vec<&str> = parsed["invocations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|invocation| invocation["tool"].as_str().unwrap())
        .collect();
    assert_eq!(tools, vec!["place_summary", "weather", "local_time"]);
}

#[tokio::test]
async fn missing_message_field_is_a_client_error() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({ "text": "Tokyo" })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn chat_rejects_get_requests() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/chat")
                .header("x-api-key", "dev-scout-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({ "message": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn caller_session_id_is_echoed_back() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({
            "session_id": "session-42",
            "message": "any trip ideas for the weekend?"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["session_id"], "session-42");
}
