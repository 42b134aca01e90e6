//! Like state machine for the local visitor.
//!
//! The store mutation is the commit point: local marks change only after it
//! succeeds. Attempts on the same review are serialized, a second one while
//! the first is still running is rejected.

use super::local_marks::{LocalLikeMarks, LocalStorage};
use super::retry_policy::RetryPolicy;
use super::visitor::AnonymousVisitorId;
use crate::storefront_store::{LikeMode, LikeMutation, StoreError, StorefrontStore};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeState {
    NotLiked,
    Liked,
}

impl From<bool> for LikeState {
    fn from(liked: bool) -> Self {
        if liked {
            LikeState::Liked
        } else {
            LikeState::NotLiked
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub review_id: String,
    pub state: LikeState,
    /// Counter reported by the store, `None` when no call was made.
    pub likes_count: Option<u64>,
    /// Store calls made, retries included.
    pub attempts: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum LikeError {
    #[error("A like change for review {0} is already in flight")]
    InFlight(String),

    #[error("Likes cannot be taken back in counter_only mode")]
    UnlikeNotSupported,

    #[error("Like change failed after {attempts} attempt(s): {source}")]
    Remote { source: StoreError, attempts: u32 },
}

impl LikeError {
    /// Whether trying again later can succeed. Local state is untouched in
    /// every error case.
    pub fn is_recoverable(&self) -> bool {
        match self {
            LikeError::InFlight(_) => true,
            LikeError::UnlikeNotSupported => false,
            LikeError::Remote { source, .. } => source.is_retryable(),
        }
    }
}

struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    review_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, review_id: &str) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(review_id.to_string());
        inserted.then(|| Self {
            set,
            review_id: review_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.review_id);
    }
}

pub struct LikeTracker {
    store: Arc<dyn StorefrontStore>,
    marks: LocalLikeMarks,
    visitor: AnonymousVisitorId,
    mode: LikeMode,
    retry: RetryPolicy,
    in_flight: Mutex<HashSet<String>>,
}

impl LikeTracker {
    /// Loads (or creates) the visitor id from `storage`.
    pub fn new(
        store: Arc<dyn StorefrontStore>,
        storage: Arc<dyn LocalStorage>,
        mode: LikeMode,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let visitor = AnonymousVisitorId::load_or_create(storage.as_ref())?;
        Ok(Self {
            store,
            marks: LocalLikeMarks::new(storage),
            visitor,
            mode,
            retry,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    pub fn visitor(&self) -> &AnonymousVisitorId {
        &self.visitor
    }

    pub fn mode(&self) -> LikeMode {
        self.mode
    }

    pub fn marks(&self) -> &LocalLikeMarks {
        &self.marks
    }

    pub fn state(&self, review_id: &str) -> LikeState {
        self.marks.is_liked(review_id).into()
    }

    /// Likes a review not liked yet, unlikes a liked one. In counter_only mode
    /// toggling a liked review does nothing.
    pub async fn toggle(&self, review_id: &str) -> Result<LikeOutcome, LikeError> {
        let target = match (self.state(review_id), self.mode) {
            (LikeState::NotLiked, _) => LikeState::Liked,
            (LikeState::Liked, LikeMode::Recorded) => LikeState::NotLiked,
            (LikeState::Liked, LikeMode::CounterOnly) => LikeState::Liked,
        };
        self.transition(review_id, target).await
    }

    pub async fn like(&self, review_id: &str) -> Result<LikeOutcome, LikeError> {
        self.transition(review_id, LikeState::Liked).await
    }

    pub async fn unlike(&self, review_id: &str) -> Result<LikeOutcome, LikeError> {
        if !self.mode.supports_unlike() {
            return Err(LikeError::UnlikeNotSupported);
        }
        self.transition(review_id, LikeState::NotLiked).await
    }

    async fn transition(
        &self,
        review_id: &str,
        target: LikeState,
    ) -> Result<LikeOutcome, LikeError> {
        let _guard = InFlightGuard::acquire(&self.in_flight, review_id)
            .ok_or_else(|| LikeError::InFlight(review_id.to_string()))?;

        if self.state(review_id) == target {
            debug!("Review {} already in state {:?}", review_id, target);
            return Ok(LikeOutcome {
                review_id: review_id.to_string(),
                state: target,
                likes_count: None,
                attempts: 0,
            });
        }

        let liked = target == LikeState::Liked;
        let (mutation, attempts) = self.commit(review_id, liked).await?;

        if let Err(err) = self.marks.set_liked(review_id, mutation.liked) {
            warn!(
                "Like on review {} committed but the local mark was not saved: {:#}",
                review_id, err
            );
        }
        info!(
            "Review {} {} by {} ({} likes)",
            review_id,
            if liked { "liked" } else { "unliked" },
            self.visitor,
            mutation.likes_count
        );

        Ok(LikeOutcome {
            review_id: review_id.to_string(),
            state: mutation.liked.into(),
            likes_count: Some(mutation.likes_count),
            attempts,
        })
    }

    async fn commit(&self, review_id: &str, liked: bool) -> Result<(LikeMutation, u32), LikeError> {
        let mut retry_count = 0;
        loop {
            let attempts = retry_count + 1;
            match self
                .store
                .set_like(review_id, self.visitor.as_str(), liked)
                .await
            {
                Ok(mutation) => return Ok((mutation, attempts)),
                Err(err) if self.retry.should_retry(&err, retry_count) => {
                    let wait = self.retry.backoff(retry_count);
                    warn!(
                        "Like on review {} failed ({}), retrying in {:?}",
                        review_id, err, wait
                    );
                    tokio::time::sleep(wait).await;
                    retry_count += 1;
                }
                Err(err) => {
                    warn!(
                        "Like on review {} failed after {} attempt(s): {}",
                        review_id, attempts, err
                    );
                    return Err(LikeError::Remote {
                        source: err,
                        attempts,
                    });
                }
            }
        }
    }
}
