//! Photo downloads
//!
//! Requests fan out with a concurrency bound and come back in request order,
//! one outcome per photo. A failed download never aborts the batch; callers
//! filter once with [`successful`].

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::PhotoInput;

/// User agent sent with every download
pub const USER_AGENT: &str = concat!("rememo-ai/", env!("CARGO_PKG_VERSION"));

/// Why a single photo could not be loaded
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("undecodable image: {0}")]
    Decode(String),
}

/// Source of raw photo bytes
#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    async fn fetch(&self, photo: &PhotoInput) -> Result<Vec<u8>, FetchError>;
}

/// Downloads photos over HTTP(S)
pub struct HttpPhotoFetcher {
    http_client: Client,
}

impl HttpPhotoFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl PhotoFetcher for HttpPhotoFetcher {
    async fn fetch(&self, photo: &PhotoInput) -> Result<Vec<u8>, FetchError> {
        debug!(photo_id = %photo.id, url = %photo.photo_url, "Fetching photo");

        let response = self
            .http_client
            .get(&photo.photo_url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Result of loading one requested photo
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub photo: PhotoInput,
    pub result: Result<T, FetchError>,
}

/// Download every photo with at most `max_concurrency` requests in flight
///
/// Outcomes are returned in the same order as `photos`.
pub async fn fetch_all(
    fetcher: &dyn PhotoFetcher,
    photos: &[PhotoInput],
    max_concurrency: usize,
) -> Vec<FetchOutcome<Vec<u8>>> {
    stream::iter(photos.iter().cloned())
        .map(|photo| async move {
            let result = fetcher.fetch(&photo).await;
            FetchOutcome { photo, result }
        })
        .buffered(max_concurrency.max(1))
        .collect()
        .await
}

/// Keep the successes, logging and dropping each failure
pub fn successful<T>(outcomes: Vec<FetchOutcome<T>>) -> Vec<(PhotoInput, T)> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome.result {
            Ok(value) => Some((outcome.photo, value)),
            Err(e) => {
                warn!(photo_id = %outcome.photo.id, error = %e, "Dropping photo");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn spawn_photo_server() -> String {
        let app = Router::new()
            .route("/ok.jpg", get(|| async { vec![1u8, 2, 3] }))
            .route("/missing.jpg", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_fetcher_reads_body_and_rejects_errors() {
        let base = spawn_photo_server().await;
        let fetcher = HttpPhotoFetcher::new(Duration::from_secs(5)).unwrap();

        let bytes = fetcher
            .fetch(&PhotoInput::new(1, format!("{}/ok.jpg", base)))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        let err = fetcher
            .fetch(&PhotoInput::new(2, format!("{}/missing.jpg", base)))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    /// Fails every photo whose id is even and tracks peak concurrency
    struct CountingFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PhotoFetcher for CountingFetcher {
        async fn fetch(&self, photo: &PhotoInput) -> Result<Vec<u8>, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match &photo.id {
                crate::models::PhotoId::Int(n) if n % 2 == 0 => Err(FetchError::Status(500)),
                _ => Ok(photo.photo_url.clone().into_bytes()),
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_order_and_bounds_concurrency() {
        let fetcher = Arc::new(CountingFetcher {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let photos: Vec<PhotoInput> = (1..=10)
            .map(|i| PhotoInput::new(i, format!("u{}", i)))
            .collect();

        let outcomes = fetch_all(fetcher.as_ref(), &photos, 3).await;

        assert_eq!(outcomes.len(), 10);
        for (outcome, photo) in outcomes.iter().zip(photos.iter()) {
            assert_eq!(&outcome.photo, photo);
        }
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);

        let kept = successful(outcomes);
        let urls: Vec<String> = kept.iter().map(|(p, _)| p.photo_url.clone()).collect();
        assert_eq!(urls, vec!["u1", "u3", "u5", "u7", "u9"]);
    }
}
