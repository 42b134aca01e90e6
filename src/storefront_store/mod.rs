//! Storage port for the storefront data.
//!
//! Everything the page reads or writes goes through [`StorefrontStore`]. The
//! SQLite store backs the HTTP server, the memory store is a fake with fault
//! injection, and the remote store talks to a running server over HTTP.

mod memory_store;
mod models;
mod remote_store;
mod schema;
mod sqlite_store;

pub use memory_store::MemoryStorefrontStore;
pub use models::*;
pub use remote_store::RemoteStorefrontStore;
pub use schema::STOREFRONT_VERSIONED_SCHEMAS;
pub use sqlite_store::SqliteStorefrontStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a storage backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),

    #[error("Backing store timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {message}")]
    Database { message: String, transient: bool },
}

impl StoreError {
    /// True for network-level and lock-contention failures that may succeed
    /// when attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) | StoreError::Timeout(_) => true,
            StoreError::Database { transient, .. } => *transient,
            StoreError::NotFound(_)
            | StoreError::PermissionDenied(_)
            | StoreError::InvalidData(_)
            | StoreError::Conflict(_) => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Timeout(_) => "timeout",
            StoreError::NotFound(_) => "not_found",
            StoreError::PermissionDenied(_) => "permission_denied",
            StoreError::InvalidData(_) => "invalid_data",
            StoreError::Conflict(_) => "conflict",
            StoreError::Database { .. } => "database",
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let transient = matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
        );
        StoreError::Database {
            message: err.to_string(),
            transient,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait StorefrontStore: Send + Sync {
    /// Returns approved reviews, newest first.
    async fn fetch_approved_reviews(&self) -> StoreResult<Vec<Review>>;

    /// Appends a new review. It starts unapproved with no likes; the store
    /// assigns `id` and `created_at`.
    async fn submit_review(&self, review: NewReview) -> StoreResult<Review>;

    /// Sets whether `anonymous_id` likes `review_id`.
    ///
    /// Returns `NotFound` if the review does not exist and `PermissionDenied`
    /// for an unlike when the store runs in [`LikeMode::CounterOnly`].
    async fn set_like(
        &self,
        review_id: &str,
        anonymous_id: &str,
        liked: bool,
    ) -> StoreResult<LikeMutation>;

    /// Returns one kind of display configuration. Platforms and screens are
    /// active entries only, sorted by `order`.
    async fn fetch_config(&self, kind: ConfigKind) -> StoreResult<ConfigPayload>;

    /// Rebuilds every review's like counter as its legacy base (likes
    /// imported or taken in counter_only mode) plus its like records, and
    /// returns how many counters were off. No-op without like records.
    async fn reconcile_like_counts(&self) -> StoreResult<usize>;

    async fn fetch_settings(&self) -> StoreResult<Option<SiteSettings>> {
        match self.fetch_config(ConfigKind::Settings).await? {
            ConfigPayload::Settings(settings) => Ok(settings),
            other => Err(unexpected_payload(ConfigKind::Settings, &other)),
        }
    }

    async fn fetch_platforms(&self) -> StoreResult<Vec<Platform>> {
        match self.fetch_config(ConfigKind::Platforms).await? {
            ConfigPayload::Platforms(platforms) => Ok(platforms),
            other => Err(unexpected_payload(ConfigKind::Platforms, &other)),
        }
    }

    async fn fetch_screens(&self) -> StoreResult<Vec<Screen>> {
        match self.fetch_config(ConfigKind::Screens).await? {
            ConfigPayload::Screens(screens) => Ok(screens),
            other => Err(unexpected_payload(ConfigKind::Screens, &other)),
        }
    }
}

fn unexpected_payload(kind: ConfigKind, payload: &ConfigPayload) -> StoreError {
    StoreError::InvalidData(format!(
        "Requested {} config, got {:?}",
        kind.as_str(),
        payload
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(StoreError::Unavailable("down".into()).is_retryable());
        assert!(StoreError::Timeout("slow".into()).is_retryable());
        assert!(StoreError::Database {
            message: "busy".into(),
            transient: true
        }
        .is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!StoreError::NotFound("r1".into()).is_retryable());
        assert!(!StoreError::PermissionDenied("rules".into()).is_retryable());
        assert!(!StoreError::InvalidData("bad".into()).is_retryable());
        assert!(!StoreError::Conflict("dup".into()).is_retryable());
        assert!(!StoreError::Database {
            message: "constraint".into(),
            transient: false
        }
        .is_retryable());
    }

    #[test]
    fn sqlite_constraint_errors_are_permanent() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id TEXT PRIMARY KEY)", []).unwrap();
        conn.execute("INSERT INTO t VALUES ('a')", []).unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "database");
        assert!(!err.is_retryable());
    }
}
