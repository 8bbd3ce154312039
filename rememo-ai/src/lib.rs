//! rememo-ai library interface
//!
//! Exposes the router, state and services for the binary and for
//! integration tests.

pub mod api;
pub mod error;
pub mod models;
pub mod ranking;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use rememo_common::config::TomlConfig;
use tower_http::trace::TraceLayer;

use crate::ranking::{strategy_for, SelectionStrategy};
use crate::services::{
    AestheticProvider, AestheticRanker, CollageVoter, DiarySettings, DiaryWriter, MultimodalModel, PhotoFetcher,
};

/// External capabilities, built once at startup and shared by every request
#[derive(Clone)]
pub struct Capabilities {
    pub fetcher: Arc<dyn PhotoFetcher>,
    pub provider: Arc<dyn AestheticProvider>,
    pub model: Arc<dyn MultimodalModel>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aesthetic_ranker: Arc<AestheticRanker>,
    pub collage_voter: Arc<CollageVoter>,
    pub diary_writer: Arc<DiaryWriter>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(capabilities: Capabilities, config: &TomlConfig) -> Self {
        let selection = config.selection.clone();
        let max_concurrency = config.fetch.max_concurrency;
        let strategy: Arc<dyn SelectionStrategy> =
            Arc::from(strategy_for(selection.strategy, selection.penalty_weight));

        let aesthetic_ranker = AestheticRanker::new(
            capabilities.fetcher.clone(),
            capabilities.provider.clone(),
            strategy,
            selection.clone(),
            max_concurrency,
        );
        let collage_voter = CollageVoter::new(
            capabilities.fetcher.clone(),
            capabilities.model.clone(),
            config.openai.model.clone(),
            selection,
            max_concurrency,
        );
        let diary_writer = DiaryWriter::new(
            capabilities.fetcher,
            capabilities.model,
            DiarySettings {
                model: config.openai.model.clone(),
                emotion_model: config.openai.emotion_model.clone(),
                image_width: config.fetch.diary_image_width,
                max_concurrency,
            },
        );

        Self {
            aesthetic_ranker: Arc::new(aesthetic_ranker),
            collage_voter: Arc::new(collage_voter),
            diary_writer: Arc::new(diary_writer),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::diary_routes())
        .merge(api::scoring_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
