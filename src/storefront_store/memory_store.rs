use super::models::{
    ConfigKind, ConfigPayload, LikeMode, LikeMutation, NewReview, Platform, Review, Screen,
    SiteSettings,
};
use super::{StoreError, StoreResult, StorefrontStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct MemoryState {
    reviews: Vec<Review>,
    likes: BTreeSet<(String, String)>,
    /// Per review likes without a record behind them.
    legacy_likes: HashMap<String, u64>,
    settings: Option<SiteSettings>,
    platforms: Vec<Platform>,
    screens: Vec<Screen>,
}

/// In-memory [`StorefrontStore`] used as a test double.
///
/// Failures can be queued per operation class and an artificial latency can
/// be applied to mutations, which makes in-flight races reproducible.
pub struct MemoryStorefrontStore {
    state: Mutex<MemoryState>,
    like_mode: LikeMode,
    read_failures: Mutex<VecDeque<StoreError>>,
    write_failures: Mutex<VecDeque<StoreError>>,
    write_latency: Mutex<Duration>,
    set_like_calls: AtomicUsize,
}

impl MemoryStorefrontStore {
    pub fn new(like_mode: LikeMode) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            like_mode,
            read_failures: Mutex::new(VecDeque::new()),
            write_failures: Mutex::new(VecDeque::new()),
            write_latency: Mutex::new(Duration::ZERO),
            set_like_calls: AtomicUsize::new(0),
        }
    }

    /// Inserts a review as-is, bypassing intake. Used to seed approved data.
    /// Its `likes_count` becomes the legacy base kept by reconciliation.
    pub fn insert_review(&self, review: Review) {
        let mut state = self.state.lock().unwrap();
        state
            .legacy_likes
            .insert(review.id.clone(), review.likes_count);
        state.reviews.push(review);
    }

    /// Overwrites a counter, the way an out-of-band edit would.
    pub fn set_likes_count(&self, review_id: &str, likes_count: u64) {
        let mut state = self.state.lock().unwrap();
        if let Some(review) = state.reviews.iter_mut().find(|r| r.id == review_id) {
            review.likes_count = likes_count;
        }
    }

    pub fn set_settings(&self, settings: Option<SiteSettings>) {
        self.state.lock().unwrap().settings = settings;
    }

    pub fn push_platform(&self, platform: Platform) {
        self.state.lock().unwrap().platforms.push(platform);
    }

    pub fn push_screen(&self, screen: Screen) {
        self.state.lock().unwrap().screens.push(screen);
    }

    /// The next read operation fails with `error`.
    pub fn fail_next_read(&self, error: StoreError) {
        self.read_failures.lock().unwrap().push_back(error);
    }

    /// The next write operation fails with `error`, before any change.
    pub fn fail_next_write(&self, error: StoreError) {
        self.write_failures.lock().unwrap().push_back(error);
    }

    pub fn set_write_latency(&self, latency: Duration) {
        *self.write_latency.lock().unwrap() = latency;
    }

    pub fn review(&self, review_id: &str) -> Option<Review> {
        self.state
            .lock()
            .unwrap()
            .reviews
            .iter()
            .find(|r| r.id == review_id)
            .cloned()
    }

    pub fn all_reviews(&self) -> Vec<Review> {
        self.state.lock().unwrap().reviews.clone()
    }

    pub fn like_records(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().likes.iter().cloned().collect()
    }

    /// Number of `set_like` calls that reached the store, failed ones included.
    pub fn set_like_calls(&self) -> usize {
        self.set_like_calls.load(Ordering::SeqCst)
    }

    fn take_read_failure(&self) -> StoreResult<()> {
        match self.read_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn before_write(&self) -> StoreResult<()> {
        let latency = *self.write_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match self.write_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MemoryStorefrontStore {
    fn default() -> Self {
        Self::new(LikeMode::default())
    }
}

#[async_trait]
impl StorefrontStore for MemoryStorefrontStore {
    async fn fetch_approved_reviews(&self) -> StoreResult<Vec<Review>> {
        self.take_read_failure()?;
        let mut reviews: Vec<Review> = self
            .state
            .lock()
            .unwrap()
            .reviews
            .iter()
            .filter(|r| r.approved)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn submit_review(&self, review: NewReview) -> StoreResult<Review> {
        self.before_write().await?;
        let stored = Review {
            id: uuid::Uuid::new_v4().to_string(),
            username: review.username,
            rating: Some(review.rating as i64),
            text: review.text,
            service: Some(review.service),
            approved: false,
            likes_count: 0,
            created_at: Utc::now(),
            image_url: None,
            photo_url: None,
            avatar_url: None,
            avatar: None,
        };
        self.state.lock().unwrap().reviews.push(stored.clone());
        Ok(stored)
    }

    async fn set_like(
        &self,
        review_id: &str,
        anonymous_id: &str,
        liked: bool,
    ) -> StoreResult<LikeMutation> {
        self.set_like_calls.fetch_add(1, Ordering::SeqCst);
        self.before_write().await?;

        let mut state = self.state.lock().unwrap();
        if !state.reviews.iter().any(|r| r.id == review_id) {
            return Err(StoreError::NotFound(format!("review {}", review_id)));
        }

        let key = (review_id.to_string(), anonymous_id.to_string());
        let changed = match (self.like_mode, liked) {
            (LikeMode::CounterOnly, true) => true,
            (LikeMode::CounterOnly, false) => {
                return Err(StoreError::PermissionDenied(
                    "unlike is not supported in counter_only mode".into(),
                ));
            }
            (LikeMode::Recorded, true) => state.likes.insert(key),
            (LikeMode::Recorded, false) => state.likes.remove(&key),
        };
        if self.like_mode == LikeMode::CounterOnly {
            *state.legacy_likes.entry(review_id.to_string()).or_default() += 1;
        }

        let review = state
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or_else(|| StoreError::NotFound(format!("review {}", review_id)))?;
        if changed {
            review.likes_count = if liked {
                review.likes_count + 1
            } else {
                review.likes_count.saturating_sub(1)
            };
        }
        Ok(LikeMutation {
            liked,
            changed,
            likes_count: review.likes_count,
        })
    }

    async fn fetch_config(&self, kind: ConfigKind) -> StoreResult<ConfigPayload> {
        self.take_read_failure()?;
        let state = self.state.lock().unwrap();
        Ok(match kind {
            ConfigKind::Settings => ConfigPayload::Settings(state.settings.clone()),
            ConfigKind::Platforms => {
                let mut platforms: Vec<Platform> =
                    state.platforms.iter().filter(|p| p.active).cloned().collect();
                platforms.sort_by_key(|p| p.order);
                ConfigPayload::Platforms(platforms)
            }
            ConfigKind::Screens => {
                let mut screens: Vec<Screen> =
                    state.screens.iter().filter(|s| s.active).cloned().collect();
                screens.sort_by_key(|s| s.order);
                ConfigPayload::Screens(screens)
            }
        })
    }

    async fn reconcile_like_counts(&self) -> StoreResult<usize> {
        if self.like_mode != LikeMode::Recorded {
            return Ok(0);
        }
        let mut state = self.state.lock().unwrap();
        let mut counts: HashMap<String, u64> = state.legacy_likes.clone();
        for (review_id, _) in state.likes.iter() {
            *counts.entry(review_id.clone()).or_default() += 1;
        }
        let mut repaired = 0;
        for review in state.reviews.iter_mut() {
            let expected = counts.get(&review.id).copied().unwrap_or(0);
            if review.likes_count != expected {
                review.likes_count = expected;
                repaired += 1;
            }
        }
        Ok(repaired)
    }
}
