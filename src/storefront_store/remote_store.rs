//! HTTP client implementing [`StorefrontStore`] against a running server.

use super::models::{ConfigKind, ConfigPayload, LikeMutation, NewReview, Review};
use super::{StoreError, StoreResult, StorefrontStore};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
struct ReviewsBody {
    reviews: Vec<Review>,
}

#[derive(Deserialize)]
struct ReconcileBody {
    repaired: usize,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct RemoteStorefrontStore {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteStorefrontStore {
    /// # Arguments
    /// * `base_url` - Server root (e.g., "http://localhost:3001")
    /// * `timeout_sec` - Per-request timeout in seconds
    pub fn new(base_url: impl Into<String>, timeout_sec: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into();
        let base_url =
            Url::parse(&base_url).with_context(|| format!("Invalid server url {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Server url {} cannot have a path", base_url);
        }

        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the server root, percent-encoding each one, so
    /// ids holding `/`, `?` or `#` stay a single segment.
    fn url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidData(format!("Bad server url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let response = Self::check_status(response).await?;
        response.json::<T>().await.map_err(map_transport_error)
    }

    async fn check_status(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("status {}", status),
        };
        Err(status_to_error(status, message))
    }
}

fn map_transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout(err.to_string())
    } else if err.is_decode() {
        StoreError::InvalidData(err.to_string())
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

fn status_to_error(status: StatusCode, message: String) -> StoreError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::InvalidData(message)
        }
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => StoreError::PermissionDenied(message),
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::CONFLICT => StoreError::Conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StoreError::Timeout(message),
        StatusCode::INTERNAL_SERVER_ERROR => StoreError::Database {
            message,
            transient: false,
        },
        s if s.is_server_error() => StoreError::Unavailable(message),
        _ => StoreError::InvalidData(message),
    }
}

#[async_trait]
impl StorefrontStore for RemoteStorefrontStore {
    async fn fetch_approved_reviews(&self) -> StoreResult<Vec<Review>> {
        let response = self
            .client
            .get(self.url(&["v1", "reviews"])?)
            .send()
            .await
            .map_err(map_transport_error)?;
        let body: ReviewsBody = Self::parse(response).await?;
        Ok(body.reviews)
    }

    async fn submit_review(&self, review: NewReview) -> StoreResult<Review> {
        let response = self
            .client
            .post(self.url(&["v1", "reviews"])?)
            .json(&review)
            .send()
            .await
            .map_err(map_transport_error)?;
        Self::parse(response).await
    }

    async fn set_like(
        &self,
        review_id: &str,
        anonymous_id: &str,
        liked: bool,
    ) -> StoreResult<LikeMutation> {
        let url = self.url(&["v1", "reviews", review_id, "likes", anonymous_id])?;
        let request = if liked {
            self.client.put(url)
        } else {
            self.client.delete(url)
        };
        let response = request.send().await.map_err(map_transport_error)?;
        Self::parse(response).await
    }

    async fn fetch_config(&self, kind: ConfigKind) -> StoreResult<ConfigPayload> {
        let response = self
            .client
            .get(self.url(&["v1", "config", kind.as_str()])?)
            .send()
            .await
            .map_err(map_transport_error)?;
        Self::parse(response).await
    }

    async fn reconcile_like_counts(&self) -> StoreResult<usize> {
        let response = self
            .client
            .post(self.url(&["v1", "likes", "reconcile"])?)
            .send()
            .await
            .map_err(map_transport_error)?;
        let body: ReconcileBody = Self::parse(response).await?;
        Ok(body.repaired)
    }
}
