//! In-memory stand-ins for the photo host, aesthetic provider and model

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use rememo_ai::models::PhotoInput;
use rememo_ai::services::{
    AestheticProvider, ContentPart, Evaluation, FetchError, ModelError, MultimodalModel, PhotoFetcher, ProviderError,
};

/// Serves a solid-colour PNG per URL
///
/// The colour comes from the number in the file name, so `.../7.png` always
/// yields the same pixels. URLs containing `missing` answer 404.
#[derive(Default)]
pub struct ColorFetcher {
    pub offline: bool,
}

fn url_number(url: &str) -> u32 {
    url.rsplit('/')
        .next()
        .and_then(|name| name.split('.').next())
        .and_then(|stem| stem.parse().ok())
        .unwrap_or(0)
}

pub fn color_for(n: u32) -> Rgb<u8> {
    Rgb([(n * 37 % 256) as u8, (n * 71 % 256) as u8, (n * 113 % 256) as u8])
}

pub fn png_bytes(color: Rgb<u8>) -> Vec<u8> {
    let img = RgbImage::from_pixel(24, 18, color);
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

#[async_trait]
impl PhotoFetcher for ColorFetcher {
    async fn fetch(&self, photo: &PhotoInput) -> Result<Vec<u8>, FetchError> {
        if self.offline {
            return Err(FetchError::Network("connection refused".to_string()));
        }
        if photo.photo_url.contains("missing") {
            return Err(FetchError::Status(404));
        }
        Ok(png_bytes(color_for(url_number(&photo.photo_url))))
    }
}

/// Embeds a photo as its first pixel and scores it by its red channel
pub struct PixelProvider;

#[async_trait]
impl AestheticProvider for PixelProvider {
    async fn evaluate(&self, image: &[u8]) -> Result<Evaluation, ProviderError> {
        let img = image::load_from_memory(image)
            .map_err(|e| ProviderError::InvalidOutput(e.to_string()))?
            .to_rgb8();
        let Rgb([r, g, b]) = *img.get_pixel(0, 0);
        Ok(Evaluation {
            embedding: vec![r as f32 + 1.0, g as f32 + 1.0, b as f32 + 1.0],
            aesthetic: r as f32 / 25.5,
        })
    }
}

/// Answers from a queue and records each call's model name and content
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    pub calls: Mutex<Vec<(String, Vec<ContentPart>)>>,
}

impl ScriptedModel {
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails as rate limited
    pub fn silent() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MultimodalModel for ScriptedModel {
    async fn respond(&self, model: &str, content: Vec<ContentPart>) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push((model.to_string(), content));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::RateLimited))
    }
}
