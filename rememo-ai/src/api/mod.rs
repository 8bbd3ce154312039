//! HTTP API handlers for rememo-ai

pub mod diary;
pub mod health;
pub mod scoring;

pub use diary::diary_routes;
pub use health::health_routes;
pub use scoring::scoring_routes;
