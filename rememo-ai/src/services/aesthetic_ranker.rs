//! Aesthetic path: fetch → evaluate → rank

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use rememo_common::config::SelectionConfig;
use tracing::{info, warn};

use super::aesthetic_client::AestheticProvider;
use super::photo_fetcher::{fetch_all, successful, PhotoFetcher};
use super::ScoringError;
use crate::models::PhotoInput;
use crate::ranking::{rank_candidates, CandidateImage, SelectionResult, SelectionStrategy};

/// Ranks a pool of photos locally from provider embeddings and scores
pub struct AestheticRanker {
    fetcher: Arc<dyn PhotoFetcher>,
    provider: Arc<dyn AestheticProvider>,
    strategy: Arc<dyn SelectionStrategy>,
    selection: SelectionConfig,
    max_concurrency: usize,
}

impl AestheticRanker {
    pub fn new(
        fetcher: Arc<dyn PhotoFetcher>,
        provider: Arc<dyn AestheticProvider>,
        strategy: Arc<dyn SelectionStrategy>,
        selection: SelectionConfig,
        max_concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            provider,
            strategy,
            selection,
            max_concurrency,
        }
    }

    /// Recommend up to `aesthetic_top_n` photos
    ///
    /// Photos that fail to download or evaluate are dropped. Only a total
    /// failure of one stage is an error.
    pub async fn rank(&self, images: &[PhotoInput]) -> Result<SelectionResult, ScoringError> {
        if images.is_empty() {
            return Ok(SelectionResult::default());
        }

        let fetched = successful(fetch_all(self.fetcher.as_ref(), images, self.max_concurrency).await);
        if fetched.is_empty() {
            return Err(ScoringError::Unavailable(format!(
                "none of the {} photos could be downloaded",
                images.len()
            )));
        }

        let fetched_count = fetched.len();
        let provider = self.provider.as_ref();
        let candidates: Vec<CandidateImage> = stream::iter(fetched)
            .map(|(photo, bytes)| async move {
                let evaluation = provider.evaluate(&bytes).await;
                (photo, evaluation)
            })
            .buffered(self.max_concurrency.max(1))
            .filter_map(|(photo, evaluation)| async move {
                match evaluation {
                    Ok(evaluation) => Some(CandidateImage {
                        id: photo.id,
                        photo_url: photo.photo_url,
                        embedding: evaluation.embedding,
                        aesthetic: evaluation.aesthetic,
                    }),
                    Err(e) => {
                        warn!(photo_id = %photo.id, error = %e, "Dropping photo the provider could not evaluate");
                        None
                    }
                }
            })
            .collect()
            .await;

        if candidates.is_empty() {
            return Err(ScoringError::Unavailable(format!(
                "aesthetic provider failed for all {} photos",
                fetched_count
            )));
        }

        let evaluated = candidates.len();
        let result = rank_candidates(candidates, &self.selection, self.strategy.as_ref());
        info!(
            requested = images.len(),
            evaluated,
            selected = result.len(),
            "Aesthetic ranking complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhotoId;
    use crate::ranking::FrozenOrderSelector;
    use crate::services::aesthetic_client::{Evaluation, ProviderError};
    use crate::services::photo_fetcher::FetchError;
    use async_trait::async_trait;

    /// Serves the photo URL itself as the image bytes
    struct EchoFetcher;

    #[async_trait]
    impl PhotoFetcher for EchoFetcher {
        async fn fetch(&self, photo: &PhotoInput) -> Result<Vec<u8>, FetchError> {
            if photo.photo_url.contains("offline") {
                return Err(FetchError::Network("connection refused".into()));
            }
            Ok(photo.photo_url.clone().into_bytes())
        }
    }

    /// Reads `<x>,<y>,<aesthetic>` from the end of the URL
    struct UrlProvider;

    #[async_trait]
    impl AestheticProvider for UrlProvider {
        async fn evaluate(&self, image: &[u8]) -> Result<Evaluation, ProviderError> {
            let text = String::from_utf8_lossy(image);
            let encoded = text.rsplit('/').next().unwrap_or_default();
            let values: Vec<f32> = encoded.split(',').filter_map(|v| v.parse().ok()).collect();
            match values.as_slice() {
                [x, y, aesthetic] => Ok(Evaluation {
                    embedding: vec![*x, *y],
                    aesthetic: *aesthetic,
                }),
                _ => Err(ProviderError::InvalidOutput(encoded.to_string())),
            }
        }
    }

    fn ranker() -> AestheticRanker {
        AestheticRanker::new(
            Arc::new(EchoFetcher),
            Arc::new(UrlProvider),
            Arc::new(FrozenOrderSelector { penalty_weight: 0.8 }),
            SelectionConfig::default(),
            4,
        )
    }

    #[tokio::test]
    async fn test_rank_drops_failed_photos() {
        let images = vec![
            PhotoInput::new(1, "https://img/1,0,9"),
            PhotoInput::new(2, "https://offline/0,1,8"),
            PhotoInput::new(3, "https://img/broken"),
            PhotoInput::new(4, "https://img/0,1,5"),
        ];

        let result = ranker().rank(&images).await.unwrap();

        assert_eq!(result.ids(), vec![PhotoId::Int(1), PhotoId::Int(4)]);
    }

    #[tokio::test]
    async fn test_rank_empty_request() {
        assert!(ranker().rank(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rank_total_outage_is_error() {
        let images = vec![PhotoInput::new(1, "https://offline/1,0,9")];
        assert!(matches!(
            ranker().rank(&images).await,
            Err(ScoringError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_rank_provider_outage_is_error() {
        let images = vec![
            PhotoInput::new(1, "https://img/broken"),
            PhotoInput::new(2, "https://img/also-broken"),
        ];
        match ranker().rank(&images).await {
            Err(ScoringError::Unavailable(message)) => assert!(message.contains("provider")),
            other => panic!("expected provider outage, got {:?}", other.map(|r| r.ids())),
        }
    }
}
