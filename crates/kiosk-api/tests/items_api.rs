//! Integration tests for the item listing and item mutations.

mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use kiosk_core::command::Command;
use kiosk_events::EventKind;
use serde_json::json;

#[tokio::test]
async fn full_listing_is_sorted_and_includes_disabled_items() {
    let app = TestApp::with_images(&["c.jpg", "a.jpg", "b.png"]).await;
    app.post_empty("/api/items/b.png/toggle").await;

    let json = app.get_json("/api/items").await;
    let items = json.as_array().unwrap();

    let ids: Vec<_> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a.jpg", "b.png", "c.jpg"]);
    assert_eq!(items[1]["enabled"], false);
    assert_eq!(items[0]["kind"], "image");
    assert_eq!(items[0]["url"], "/images/a.jpg");
}

#[tokio::test]
async fn display_listing_is_stable_and_skips_disabled_items() {
    let app = TestApp::with_images(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]).await;
    app.post_empty("/api/items/c.jpg/toggle").await;

    let first = app.display_order().await;
    let second = app.display_order().await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(!first.contains(&"c.jpg".to_string()));
}

#[tokio::test]
async fn toggle_flips_and_reports_state() {
    let app = TestApp::with_images(&["a.jpg"]).await;

    let json = body_json(app.post_empty("/api/items/a.jpg/toggle").await).await;
    assert_eq!(json["data"]["enabled"], false);

    let json = body_json(app.post_empty("/api/items/a.jpg/toggle").await).await;
    assert_eq!(json["data"]["enabled"], true);
}

#[tokio::test]
async fn toggling_unknown_item_is_404() {
    let app = TestApp::new().await;

    let response = app.post_empty("/api/items/ghost.jpg/toggle").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn theme_assignment_drives_the_theme_filter() {
    let app = TestApp::with_images(&["sea.jpg", "forest.jpg"]).await;
    app.post_json("/api/themes", json!({ "name": "Sea" })).await;

    let response = app
        .post_json("/api/items/sea.jpg/themes", json!({ "themes": ["Sea"] }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    app.post_json("/api/themes/active", json!({ "theme": "Sea" })).await;

    assert_eq!(app.display_order().await, vec!["sea.jpg"]);
}

#[tokio::test]
async fn assigning_unknown_theme_is_404() {
    let app = TestApp::with_images(&["sea.jpg"]).await;

    let response = app
        .post_json("/api/items/sea.jpg/themes", json!({ "themes": ["Nope"] }))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn crop_is_stored_and_pushed() {
    let app = TestApp::with_images(&["a.jpg"]).await;
    let mut events = app.state.event_bus.subscribe();

    let response = app
        .post_json(
            "/api/items/a.jpg/crop",
            json!({ "x": 0.1, "y": 0.1, "width": 0.5, "height": 0.5 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let listed = app.get_json("/api/items").await;
    assert_eq!(listed[0]["crop"]["width"], 0.5);

    let mut pushed = false;
    while let Ok(event) = events.try_recv() {
        if event.kind
            == (EventKind::RemoteCommand {
                command: Command::RefreshCrop {
                    target: "a.jpg".into(),
                },
            })
        {
            pushed = true;
        }
    }
    assert!(pushed, "refresh_crop must be pushed to clients");

    let response = app.delete("/api/items/a.jpg/crop").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.get_json("/api/items").await[0].get("crop").is_none());
}

#[tokio::test]
async fn crop_outside_the_image_is_rejected() {
    let app = TestApp::with_images(&["a.jpg"]).await;

    let out_of_range = app
        .post_json(
            "/api/items/a.jpg/crop",
            json!({ "x": 1.5, "y": 0.0, "width": 0.5, "height": 0.5 }),
        )
        .await;
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let overflowing = app
        .post_json(
            "/api/items/a.jpg/crop",
            json!({ "x": 0.8, "y": 0.0, "width": 0.5, "height": 0.5 }),
        )
        .await;
    assert_eq!(overflowing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_file_and_settings() {
    let app = TestApp::with_images(&["a.jpg", "b.jpg"]).await;
    app.post_empty("/api/items/a.jpg/toggle").await;

    let response = app.delete("/api/items/a.jpg").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!app.config.media_dir.join("a.jpg").exists());
    assert!(!app.state.store.read(|s| s.enabled_items.contains_key("a.jpg")).await);
    assert_eq!(app.delete("/api/items/a.jpg").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_the_displayed_item_reshuffles() {
    let app = TestApp::with_images(&["a.jpg", "b.jpg", "c.jpg"]).await;
    app.post_json("/api/kiosk/current-image", json!({ "image_name": "b.jpg" }))
        .await;
    let before = app.shuffle_seed().await;

    app.delete("/api/items/b.jpg").await;

    assert_ne!(app.shuffle_seed().await, before);
}
