//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chatstory_core::timer::Timer;
use chatstory_narrative::domain::playback::{PlaybackConfig, PlaybackSnapshot};
use chatstory_test_support::{FixedClock, InstantTimer};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use chatstory_api::routes;
use chatstory_api::state::AppState;

/// State whose waits complete immediately.
pub fn instant_state() -> AppState {
    state_with(Arc::new(InstantTimer::new()))
}

/// State with a caller-supplied timer and a fixed clock.
pub fn state_with(timer: Arc<dyn Timer>) -> AppState {
    AppState::new(
        Arc::new(FixedClock::standard()),
        timer,
        PlaybackConfig::default(),
    )
}

/// Build the full app router. Uses the same route structure as `main.rs`.
pub fn build_test_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest(
            "/api/v1/stories",
            routes::stories::router().merge(routes::playback::router()),
        )
        .with_state(state)
}

/// The builder's starter conversation as draft JSON.
pub fn sample_story_json() -> serde_json::Value {
    serde_json::json!({
        "title": "3am",
        "characters": [
            { "id": "c1", "name": "Alex", "side": "left", "color": "#4f46e5" },
            { "id": "c2", "name": "Riley", "side": "right", "color": "#ec4899" },
        ],
        "messages": [
            { "id": "m1", "type": "line", "senderId": "c1", "text": "Hey. You awake?", "delay": 800 },
            { "id": "m2", "type": "line", "senderId": "c2", "text": "Barely. What's up?", "delay": 1200 },
            {
                "id": "m3", "type": "choice", "senderId": "c1", "delay": 1500,
                "choices": [
                    { "id": "a", "text": "It's nothing, never mind.", "nextId": "m4" },
                    { "id": "b", "text": "I think someone is outside.", "nextId": "m5" },
                ],
            },
            { "id": "m4", "type": "line", "senderId": "c2", "text": "You can't text me at 3am and say it's nothing.", "delay": 1500 },
            { "id": "m5", "type": "line", "senderId": "c2", "text": "Wait, what? Outside where?", "delay": 1500 },
        ],
    })
}

/// Creates the sample story and returns its id.
pub async fn create_sample_story(state: &AppState) -> Uuid {
    let (status, json) = send_json(
        build_test_app(state.clone()),
        "POST",
        "/api/v1/stories",
        Some(&sample_story_json()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    Uuid::parse_str(json["story_id"].as_str().unwrap()).unwrap()
}

/// Send a request with an optional JSON body and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send_json(app, "GET", uri, None).await
}

/// Waits until the story's playback snapshot satisfies `predicate`.
pub async fn wait_for_playback(
    state: &AppState,
    story_id: Uuid,
    mut predicate: impl FnMut(&PlaybackSnapshot) -> bool,
) -> PlaybackSnapshot {
    let session = state.session(story_id).await.unwrap();
    let mut rx = session.driver().subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for playback state")
        .expect("driver dropped");
    snapshot.clone()
}

/// Ids of the messages in a preview frame.
pub fn frame_ids(frame: &serde_json::Value) -> Vec<String> {
    frame["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_owned())
        .collect()
}
