//! I/O collaborators around the ranking core
//!
//! Everything that talks to the network or touches pixels lives here. The
//! external capabilities (photo source, aesthetic provider, multimodal model)
//! are traits so tests can substitute in-memory fakes.

pub mod aesthetic_client;
pub mod aesthetic_ranker;
pub mod collage_vote;
pub mod diary_writer;
pub mod imaging;
pub mod openai_client;
pub mod photo_fetcher;
pub mod prompts;

pub use aesthetic_client::{AestheticProvider, Evaluation, HttpAestheticProvider, ProviderError};
pub use aesthetic_ranker::AestheticRanker;
pub use collage_vote::{CollageVoter, JudgedPool};
pub use diary_writer::{DiaryError, DiarySettings, DiaryWriter};
pub use openai_client::{ContentPart, ModelError, MultimodalModel, OpenAiClient};
pub use photo_fetcher::{FetchError, FetchOutcome, HttpPhotoFetcher, PhotoFetcher};

use thiserror::Error;

/// A scoring request could not be served at all
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Every photo failed at one stage (download or evaluation)
    #[error("scoring unavailable: {0}")]
    Unavailable(String),
}
