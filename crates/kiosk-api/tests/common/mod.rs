#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use kiosk_api::config::ServerConfig;
use kiosk_api::router::build_app_router;
use kiosk_api::state::AppState;
use kiosk_player::testing::FakeVideoProcess;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// A fully wired application over a temporary data directory and a fake
/// video player.
pub struct TestApp {
    pub dir: TempDir,
    pub config: ServerConfig,
    pub state: AppState,
    pub player: FakeVideoProcess,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_images(&[]).await
    }

    /// Start with `names` present as (empty) files in the media directory.
    pub async fn with_images(names: &[&str]) -> Self {
        Self::with_config(names, |_| {}).await
    }

    /// Like [`TestApp::with_images`], with `adjust` applied to the config
    /// before the state is built.
    pub async fn with_config(names: &[&str], adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::with_data_dir(dir.path());
        config.host = "127.0.0.1".into();
        config.port = 0;
        adjust(&mut config);

        std::fs::create_dir_all(&config.media_dir).unwrap();
        for name in names {
            std::fs::write(config.media_dir.join(name), b"img").unwrap();
        }

        let player = FakeVideoProcess::new();
        let state = AppState::build(config.clone(), Arc::new(player.clone()))
            .await
            .unwrap();

        Self {
            dir,
            config,
            state,
            player,
        }
    }

    /// A fresh router over the shared state; `oneshot` consumes it.
    pub fn app(&self) -> Router {
        build_app_router(self.state.clone(), &self.config)
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        get(self.app(), uri).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        post_json(self.app(), uri, body).await
    }

    pub async fn post_empty(&self, uri: &str) -> Response<Body> {
        send(self.app(), Method::POST, uri, Body::empty(), None).await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        send(self.app(), Method::DELETE, uri, Body::empty(), None).await
    }

    /// `GET` and decode the JSON body.
    pub async fn get_json(&self, uri: &str) -> Value {
        body_json(self.get(uri).await).await
    }

    /// Ids from the display listing, in display order.
    pub async fn display_order(&self) -> Vec<String> {
        let json = self.get_json("/api/items?enabled_only=true").await;
        json.as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_string())
            .collect()
    }

    pub async fn shuffle_seed(&self) -> f64 {
        self.state.store.read(|s| s.shuffle_seed).await
    }

    /// Register a video and return its id.
    pub async fn register_video(&self, url: &str) -> String {
        let json = body_json(self.post_json("/api/videos", serde_json::json!({ "url": url })).await).await;
        json["data"]["id"].as_str().unwrap().to_string()
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty(), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Body::from(body.to_string()),
        Some("application/json"),
    )
    .await
}

async fn send(app: Router, method: Method, uri: &str, body: Body, content_type: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    app.oneshot(request.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `condition` until it holds or a second has passed.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
