//! Embedding & aesthetic provider
//!
//! The provider is an external model server: one image in, one feature
//! vector and one quality score out. Calls are independent per image.
//!
//! # API
//! ```text
//! POST {endpoint}
//! {"image": "<base64 image bytes>"}
//!
//! 200 {"embedding": [f32, ...], "aesthetic": f32}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::photo_fetcher::USER_AGENT;

/// Provider output for one image
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Evaluation {
    pub embedding: Vec<f32>,
    pub aesthetic: f32,
}

/// A provider call failed for one image
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("malformed provider response: {0}")]
    Parse(String),

    #[error("invalid provider output: {0}")]
    InvalidOutput(String),
}

/// `evaluate(image_bytes) -> (embedding, aesthetic)`
#[async_trait]
pub trait AestheticProvider: Send + Sync {
    async fn evaluate(&self, image: &[u8]) -> Result<Evaluation, ProviderError>;
}

#[derive(Serialize)]
struct EvaluateRequest<'a> {
    image: &'a str,
}

/// HTTP client for a remote provider
pub struct HttpAestheticProvider {
    http_client: Client,
    endpoint: String,
}

impl HttpAestheticProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AestheticProvider for HttpAestheticProvider {
    async fn evaluate(&self, image: &[u8]) -> Result<Evaluation, ProviderError> {
        let encoded = STANDARD.encode(image);
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&EvaluateRequest { image: &encoded })
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let mut evaluation: Evaluation = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if !evaluation.aesthetic.is_finite() {
            return Err(ProviderError::InvalidOutput("non-finite aesthetic score".to_string()));
        }
        l2_normalize(&mut evaluation.embedding);

        debug!(
            dimension = evaluation.embedding.len(),
            aesthetic = evaluation.aesthetic,
            "Evaluated image"
        );
        Ok(evaluation)
    }
}

/// Scale to unit length in place; zero vectors are left for the similarity
/// builder to reject
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
