//! Shared fixtures for rememo-ai integration tests

#![allow(dead_code)]

pub mod fakes;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use rememo_ai::{AppState, Capabilities};
use rememo_common::config::TomlConfig;
use serde_json::Value;

use fakes::{ColorFetcher, PixelProvider, ScriptedModel};

/// Config with small collage tiles so tests stay fast
pub fn test_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.selection.thumb_size = 32;
    config.fetch.max_concurrency = 4;
    config.fetch.diary_image_width = 16;
    config
}

/// State wired to the in-memory fakes
pub fn test_app_state(model: Arc<ScriptedModel>) -> AppState {
    let capabilities = Capabilities {
        fetcher: Arc::new(ColorFetcher::default()),
        provider: Arc::new(PixelProvider),
        model,
    };
    AppState::new(capabilities, &test_config())
}

/// State whose fetcher fails every download
pub fn offline_app_state() -> AppState {
    let capabilities = Capabilities {
        fetcher: Arc::new(ColorFetcher { offline: true }),
        provider: Arc::new(PixelProvider),
        model: ScriptedModel::silent(),
    };
    AppState::new(capabilities, &test_config())
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
