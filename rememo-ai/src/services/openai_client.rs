//! Multimodal language model client (OpenAI Responses API)
//!
//! # API Reference
//! - Endpoint: `POST {base_url}/responses`
//! - Auth: `Authorization: Bearer <key>`
//! - Input: one user message whose content is a list of `input_text` and
//!   `input_image` parts
//! - Output: text is the concatenation of every `output_text` part

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::photo_fetcher::USER_AGENT;

/// One piece of a user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
    /// `image_url` is a data URL or a public URL
    InputImage { image_url: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::InputText { text: text.into() }
    }

    pub fn image(image_url: impl Into<String>) -> Self {
        ContentPart::InputImage {
            image_url: image_url.into(),
        }
    }
}

/// Model call failure
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("connection to model API failed: {0}")]
    Connection(String),

    #[error("model API rate limit reached")]
    RateLimited,

    #[error("model API rejected the API key")]
    InvalidApiKey,

    #[error("model API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Parse(String),

    #[error("model returned no text")]
    EmptyResponse,
}

impl ModelError {
    /// Stable error code reported to HTTP callers
    pub fn code(&self) -> String {
        match self {
            ModelError::Connection(_) => "API_CONNECTION_ERROR".to_string(),
            ModelError::RateLimited => "RATE_LIMIT".to_string(),
            ModelError::InvalidApiKey => "API_STATUS_401".to_string(),
            ModelError::Status { status, .. } => format!("API_STATUS_{}", status),
            ModelError::Parse(_) | ModelError::EmptyResponse => "UNKNOWN_ERROR".to_string(),
        }
    }
}

/// Text-out model taking mixed text/image input
#[async_trait]
pub trait MultimodalModel: Send + Sync {
    async fn respond(&self, model: &str, content: Vec<ContentPart>) -> Result<String, ModelError>;
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: [InputMessage; 1],
}

#[derive(Serialize)]
struct InputMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesReply {
    fn output_text(&self) -> String {
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

/// Responses API client
pub struct OpenAiClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl MultimodalModel for OpenAiClient {
    async fn respond(&self, model: &str, content: Vec<ContentPart>) -> Result<String, ModelError> {
        let images = content
            .iter()
            .filter(|p| matches!(p, ContentPart::InputImage { .. }))
            .count();
        debug!(model, parts = content.len(), images, "Calling model");

        let request = ResponsesRequest {
            model,
            input: [InputMessage { role: "user", content }],
        };

        let response = self
            .http_client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model, status = status.as_u16(), "Model API returned error status");
            return Err(match status {
                StatusCode::UNAUTHORIZED => ModelError::InvalidApiKey,
                StatusCode::TOO_MANY_REQUESTS => ModelError::RateLimited,
                _ => ModelError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let reply: ResponsesReply = response
            .json()
            .await
            .map_err(|e| ModelError::Parse(e.to_string()))?;

        let text = reply.output_text().trim().to_string();
        if text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn spawn_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    #[test]
    fn test_content_part_wire_format() {
        let parts = vec![ContentPart::text("hi"), ContentPart::image("data:image/png;base64,AA")];
        assert_eq!(
            serde_json::to_value(&parts).unwrap(),
            json!([
                {"type": "input_text", "text": "hi"},
                {"type": "input_image", "image_url": "data:image/png;base64,AA"}
            ])
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ModelError::Connection("x".into()).code(), "API_CONNECTION_ERROR");
        assert_eq!(ModelError::RateLimited.code(), "RATE_LIMIT");
        assert_eq!(
            ModelError::Status {
                status: 500,
                body: String::new()
            }
            .code(),
            "API_STATUS_500"
        );
        assert_eq!(ModelError::EmptyResponse.code(), "UNKNOWN_ERROR");
    }

    #[tokio::test]
    async fn test_respond_collects_output_text() {
        let router = Router::new().route(
            "/v1/responses",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer sk-test");
                if !authorized || body["model"] != "gpt-4.1" || body["input"][0]["role"] != "user" {
                    return (StatusCode::BAD_REQUEST, Json(json!({})));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "output": [
                            {"type": "reasoning"},
                            {"type": "message", "content": [
                                {"type": "output_text", "text": " 3, 7,"},
                                {"type": "refusal", "refusal": "no"},
                                {"type": "output_text", "text": " 12 "}
                            ]}
                        ]
                    })),
                )
            }),
        );
        let base_url = spawn_api(router).await;
        let client = OpenAiClient::new(&base_url, "sk-test".to_string(), Duration::from_secs(5)).unwrap();

        let text = client
            .respond("gpt-4.1", vec![ContentPart::text("pick")])
            .await
            .unwrap();

        assert_eq!(text, "3, 7, 12");
    }

    #[tokio::test]
    async fn test_respond_maps_status_codes() {
        let router = Router::new()
            .route("/v1/responses", post(|| async { StatusCode::TOO_MANY_REQUESTS }))
            .route("/auth/responses", post(|| async { StatusCode::UNAUTHORIZED }))
            .route("/empty/responses", post(|| async { Json(json!({"output": []})) }));
        let base_url = spawn_api(router).await;
        let root = base_url.trim_end_matches("/v1").to_string();

        let client = OpenAiClient::new(&base_url, "k".into(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.respond("m", vec![]).await,
            Err(ModelError::RateLimited)
        ));

        let client = OpenAiClient::new(&format!("{}/auth", root), "k".into(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.respond("m", vec![]).await,
            Err(ModelError::InvalidApiKey)
        ));

        let client = OpenAiClient::new(&format!("{}/empty/", root), "k".into(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.respond("m", vec![]).await,
            Err(ModelError::EmptyResponse)
        ));
    }
}
