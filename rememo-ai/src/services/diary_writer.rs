//! Diary generation and revision

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::imaging::{decode_rgb, jpeg_data_url, resize_to_width};
use super::openai_client::{ContentPart, ModelError, MultimodalModel};
use super::photo_fetcher::{fetch_all, PhotoFetcher};
use super::prompts::{diary_modify_prompt, diary_prompt, emotion_prompt, EMOTION_LABELS};
use crate::models::{DiaryModifyRequest, DiaryRequest, DiaryResponse, PhotoId, PhotoInput, PhotoItem};

/// Label used when a reply carries no recognisable emotion
pub const UNKNOWN_EMOTION: &str = "unknown";

const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', '…'];

#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("photo {url} unavailable: {reason}")]
    PhotoUnavailable { url: String, reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Model names and image sizing for diary requests
#[derive(Debug, Clone)]
pub struct DiarySettings {
    pub model: String,
    pub emotion_model: String,
    pub image_width: u32,
    pub max_concurrency: usize,
}

/// Writes and revises diaries with the multimodal model
pub struct DiaryWriter {
    fetcher: Arc<dyn PhotoFetcher>,
    model: Arc<dyn MultimodalModel>,
    settings: DiarySettings,
}

impl DiaryWriter {
    pub fn new(fetcher: Arc<dyn PhotoFetcher>, model: Arc<dyn MultimodalModel>, settings: DiarySettings) -> Self {
        Self {
            fetcher,
            model,
            settings,
        }
    }

    /// Write a diary covering every photo, then label its emotion
    pub async fn generate(&self, request: &DiaryRequest) -> Result<DiaryResponse, DiaryError> {
        let photos = ordered_photos(&request.image_info);
        let prompt = diary_prompt(&request.user_speech, &image_information(&photos));

        let mut content = vec![ContentPart::text(prompt)];
        content.extend(self.encode_photos(&photos).await?.into_iter().map(ContentPart::image));

        let diary = self
            .model
            .respond(&self.settings.model, content)
            .await?
            .trim()
            .to_string();

        let label = self
            .model
            .respond(
                &self.settings.emotion_model,
                vec![ContentPart::text(emotion_prompt(&diary))],
            )
            .await?;
        let emoji = normalize_emotion(&label);

        info!(photos = photos.len(), chars = diary.chars().count(), %emoji, "Diary generated");
        Ok(DiaryResponse { diary, emoji })
    }

    /// Revise a diary as the user asked
    pub async fn modify(&self, request: &DiaryModifyRequest) -> Result<DiaryResponse, DiaryError> {
        let diary = match request.modify_lines.as_deref() {
            Some(lines) if !lines.is_empty() => mark_sentences(&request.diary, lines),
            _ => request.diary.clone(),
        };
        let prompt = diary_modify_prompt(&request.user_speech, &diary, &request.user_request);

        let reply = self
            .model
            .respond(&self.settings.model, vec![ContentPart::text(prompt)])
            .await?;
        let response = parse_modify_reply(&reply);

        info!(emoji = %response.emoji, "Diary modified");
        Ok(response)
    }

    /// Download, shrink and JPEG-encode every photo, failing on the first loss
    async fn encode_photos(&self, photos: &[&PhotoItem]) -> Result<Vec<String>, DiaryError> {
        let inputs: Vec<PhotoInput> = photos
            .iter()
            .enumerate()
            .map(|(i, p)| PhotoInput::new(PhotoId::Int(i as i64 + 1), p.photo_url.clone()))
            .collect();

        let mut encoded = Vec::with_capacity(inputs.len());
        for outcome in fetch_all(self.fetcher.as_ref(), &inputs, self.settings.max_concurrency).await {
            let url = outcome.photo.photo_url;
            let bytes = outcome.result.map_err(|e| DiaryError::PhotoUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

            let width = self.settings.image_width;
            let data_url = tokio::task::spawn_blocking(move || {
                let img = decode_rgb(&bytes).map_err(|e| e.to_string())?;
                jpeg_data_url(&resize_to_width(&img, width)).map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| e.to_string())
            .and_then(|r| r)
            .map_err(|reason| DiaryError::PhotoUnavailable {
                url: url.clone(),
                reason,
            })?;

            debug!(%url, "Encoded diary photo");
            encoded.push(data_url);
        }
        Ok(encoded)
    }
}

/// Photos by `sequence`, those without one last, ties in request order
pub fn ordered_photos(photos: &[PhotoItem]) -> Vec<&PhotoItem> {
    let mut ordered: Vec<&PhotoItem> = photos.iter().collect();
    ordered.sort_by_key(|p| (p.sequence.is_none(), p.sequence));
    ordered
}

/// Per-photo metadata block for the diary prompt
pub fn image_information(photos: &[&PhotoItem]) -> String {
    photos
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "Photo {}:\n  Date: {}\n  Location: {}\n  Keywords: {}",
                i + 1,
                p.shooting_date_time.as_deref().unwrap_or("unknown"),
                p.detailed_address.as_deref().unwrap_or("unknown"),
                p.keyword.as_deref().unwrap_or("none"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Lower-case the classifier's answer and pull out a known label if present
pub fn normalize_emotion(answer: &str) -> String {
    let cleaned = answer
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    if EMOTION_LABELS.contains(&cleaned.as_str()) {
        return cleaned;
    }

    cleaned
        .split(|c: char| !c.is_alphanumeric())
        .find(|word| EMOTION_LABELS.contains(word))
        .map(str::to_string)
        .unwrap_or(cleaned)
}

/// Split into sentences ending at `.`, `!`, `?` or `…`
///
/// Terminators with no text before them are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.trim().chars() {
        if SENTENCE_TERMINATORS.contains(&ch) {
            if !current.is_empty() {
                current.push(ch);
                sentences.push(current.trim().to_string());
                current.clear();
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        sentences.push(current.trim().to_string());
    }

    sentences
}

/// Sorted, de-duplicated runs of consecutive indices
pub fn group_consecutive(indices: &[usize]) -> Vec<Vec<usize>> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut groups: Vec<Vec<usize>> = Vec::new();
    for index in sorted {
        match groups.last_mut() {
            Some(group) if group.last().map(|&last| last + 1) == Some(index) => group.push(index),
            _ => groups.push(vec![index]),
        }
    }
    groups
}

/// Wrap each run of selected sentences (1-based) in `@...@`
pub fn mark_sentences(diary: &str, indices: &[usize]) -> String {
    let sentences = split_sentences(diary);
    let runs: HashMap<usize, usize> = group_consecutive(indices)
        .into_iter()
        .filter_map(|group| group.first().map(|&start| (start, group.len())))
        .collect();

    let mut parts = Vec::with_capacity(sentences.len());
    let mut i = 0;
    while i < sentences.len() {
        match runs.get(&(i + 1)) {
            Some(&len) => {
                let end = (i + len).min(sentences.len());
                parts.push(format!("@{}@", sentences[i..end].join(" ")));
                i = end;
            }
            None => {
                parts.push(sentences[i].clone());
                i += 1;
            }
        }
    }
    parts.join(" ")
}

/// Read `<DIARY>`/`<EMOTION>` tags, falling back to a trailing "text, label"
pub fn parse_modify_reply(reply: &str) -> DiaryResponse {
    let output = reply.trim();

    if output.contains("<DIARY>") && output.contains("<EMOTION>") {
        if let (Some(diary), Some(emoji)) = (
            between(output, "<DIARY>", "</DIARY>"),
            between(output, "<EMOTION>", "</EMOTION>"),
        ) {
            return DiaryResponse {
                diary: diary.trim().to_string(),
                emoji: emoji.trim().to_lowercase(),
            };
        }
        warn!("Tagged diary reply is malformed");
        return DiaryResponse {
            diary: output.to_string(),
            emoji: UNKNOWN_EMOTION.to_string(),
        };
    }

    warn!("Diary reply has no tags; reading trailing label");
    match output.rsplit_once(' ') {
        Some((text, label)) => {
            let text = text.strip_suffix(',').map(str::trim).unwrap_or(text);
            DiaryResponse {
                diary: text.to_string(),
                emoji: label.to_lowercase(),
            }
        }
        None => DiaryResponse {
            diary: output.to_string(),
            emoji: UNKNOWN_EMOTION.to_string(),
        },
    }
}

fn between<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = start + text[start..].find(close)?;
    Some(&text[start..end])
}
