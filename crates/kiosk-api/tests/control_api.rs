//! Integration tests for the remote-control channel.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use kiosk_core::command::Command;
use kiosk_events::EventKind;
use serde_json::json;

const T0: f64 = 1_700_000_000.0;

#[tokio::test]
async fn sent_command_is_polled_once() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/control/send", json!({ "command": "next" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["command"]["command"], "next");

    let polled = app.get_json("/api/control/poll").await;
    assert_eq!(polled["command"]["command"], "next");

    let again = app.get_json("/api/control/poll").await;
    assert!(again["command"].is_null());
}

#[tokio::test]
async fn newer_command_overwrites_pending_one() {
    let app = TestApp::new().await;

    app.post_json("/api/control/send", json!({ "command": "next" })).await;
    app.post_json("/api/control/send", json!({ "command": "jump", "image_name": "a.jpg" }))
        .await;

    let polled = app.get_json("/api/control/poll").await;
    assert_eq!(polled["command"]["command"], "jump");
    assert_eq!(polled["command"]["image_name"], "a.jpg");
}

#[tokio::test]
async fn command_expires_after_ttl() {
    let app = TestApp::with_config(&[], |config| config.command_ttl_secs = 1).await;
    app.post_json("/api/control/send", json!({ "command": "pause" })).await;

    let fresh = app.get_json("/api/control/poll").await;
    assert_eq!(fresh["command"]["command"], "pause");

    app.post_json("/api/control/send", json!({ "command": "play" })).await;
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let stale = app.get_json("/api/control/poll").await;
    assert!(stale["command"].is_null());
}

#[tokio::test]
async fn pinned_clock_does_not_keep_commands_alive() {
    let app = TestApp::with_config(&[], |config| config.command_ttl_secs = 1).await;
    app.post_json("/api/test/time", json!({ "timestamp": T0 })).await;
    app.post_json("/api/control/send", json!({ "command": "next" })).await;

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let stale = app.get_json("/api/control/poll").await;
    assert!(stale["command"].is_null());
    assert_eq!(app.state.clock.unix_secs(), T0);
}

#[tokio::test]
async fn unknown_command_is_rejected() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/control/send", json!({ "command": "explode" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(app.get_json("/api/control/poll").await["command"].is_null());
}

#[tokio::test]
async fn jump_without_target_is_rejected() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/control/send", json!({ "command": "jump" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn commands_are_pushed_to_live_clients() {
    let app = TestApp::new().await;
    let mut events = app.state.event_bus.subscribe();

    app.post_json("/api/control/send", json!({ "command": "reload" })).await;

    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, EventKind::RemoteCommand { command: Command::Reload });
}
