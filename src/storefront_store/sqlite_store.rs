use super::models::{
    ConfigKind, ConfigPayload, LikeMode, LikeMutation, NewReview, Platform, Review, Screen,
    SiteSettings,
};
use super::schema::STOREFRONT_VERSIONED_SCHEMAS;
use super::{StoreError, StoreResult, StorefrontStore};
use crate::sqlite_persistence::open_versioned;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const SETTINGS_COLLECTION: &str = "settings";
const SETTINGS_DOCUMENT: &str = "public";

pub struct SqliteStorefrontStore {
    conn: Arc<Mutex<Connection>>,
    like_mode: LikeMode,
}

impl SqliteStorefrontStore {
    pub fn new<P: AsRef<Path>>(db_path: P, like_mode: LikeMode) -> Result<Self> {
        let path = db_path.as_ref();
        info!("Opening storefront database at {:?}", path);
        let conn = Connection::open(path).context("Failed to open storefront database")?;
        Self::from_connection(conn, like_mode)
    }

    pub fn in_memory(like_mode: LikeMode) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, like_mode)
    }

    fn from_connection(mut conn: Connection, like_mode: LikeMode) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        open_versioned(&mut conn, STOREFRONT_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            like_mode,
        })
    }

    pub fn like_mode(&self) -> LikeMode {
        self.like_mode
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("storefront database lock poisoned".into()))
    }

    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn parse_datetime(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    /// Reads a rating the way the page does: numbers and numeric text are
    /// accepted, anything else is treated as unrated.
    fn parse_rating(value: Value) -> Option<i64> {
        match value {
            Value::Integer(i) => Some(i),
            Value::Real(f) if f.fract() == 0.0 => Some(f as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    fn row_to_review(row: &rusqlite::Row) -> rusqlite::Result<Review> {
        let created_at: String = row.get("created_at")?;
        let likes_count: i64 = row.get("likes_count")?;
        Ok(Review {
            id: row.get("id")?,
            username: row.get("username")?,
            rating: Self::parse_rating(row.get("rating")?),
            text: row.get("text")?,
            service: row.get("service")?,
            approved: row.get::<_, i64>("approved")? != 0,
            likes_count: likes_count.max(0) as u64,
            created_at: Self::parse_datetime(&created_at),
            image_url: row.get("image_url")?,
            photo_url: row.get("photo_url")?,
            avatar_url: row.get("avatar_url")?,
            avatar: row.get("avatar")?,
        })
    }

    fn row_to_platform(row: &rusqlite::Row) -> rusqlite::Result<Platform> {
        Ok(Platform {
            id: row.get("id")?,
            name: row.get("name")?,
            logo_url: row.get("logo_url")?,
            whatsapp_url: row.get("whatsapp_url")?,
            order: row.get("sort_order")?,
            active: row.get::<_, i64>("active")? != 0,
        })
    }

    fn row_to_screen(row: &rusqlite::Row) -> rusqlite::Result<Screen> {
        Ok(Screen {
            id: row.get("id")?,
            image_url: row.get("image_url")?,
            order: row.get("sort_order")?,
            active: row.get::<_, i64>("active")? != 0,
        })
    }

    fn read_likes_count(conn: &Connection, review_id: &str) -> StoreResult<u64> {
        let count: Option<i64> = conn
            .query_row(
                "SELECT likes_count FROM reviews WHERE id = ?1",
                params![review_id],
                |row| row.get(0),
            )
            .optional()?;
        count
            .map(|c| c.max(0) as u64)
            .ok_or_else(|| StoreError::NotFound(format!("review {}", review_id)))
    }

    fn apply_like(
        &self,
        conn: &mut Connection,
        review_id: &str,
        anonymous_id: &str,
        liked: bool,
    ) -> StoreResult<LikeMutation> {
        let tx = conn.transaction()?;
        Self::read_likes_count(&tx, review_id)?;

        let changed = match (self.like_mode, liked) {
            (LikeMode::CounterOnly, true) => true,
            (LikeMode::CounterOnly, false) => {
                return Err(StoreError::PermissionDenied(
                    "unlike is not supported in counter_only mode".into(),
                ));
            }
            (LikeMode::Recorded, true) => {
                tx.execute(
                    "INSERT OR IGNORE INTO review_likes (review_id, anonymous_id, created_at) VALUES (?1, ?2, ?3)",
                    params![review_id, anonymous_id, Self::format_datetime(&Utc::now())],
                )? == 1
            }
            (LikeMode::Recorded, false) => {
                tx.execute(
                    "DELETE FROM review_likes WHERE review_id = ?1 AND anonymous_id = ?2",
                    params![review_id, anonymous_id],
                )? == 1
            }
        };

        if changed {
            let sql = match (self.like_mode, liked) {
                // Counter-only likes have no record, so they join the base
                // that reconciliation keeps.
                (LikeMode::CounterOnly, _) => {
                    "UPDATE reviews SET likes_count = likes_count + 1, legacy_likes = legacy_likes + 1 WHERE id = ?1"
                }
                (LikeMode::Recorded, true) => {
                    "UPDATE reviews SET likes_count = likes_count + 1 WHERE id = ?1"
                }
                (LikeMode::Recorded, false) => {
                    "UPDATE reviews SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?1"
                }
            };
            tx.execute(sql, params![review_id])?;
        }

        let likes_count = Self::read_likes_count(&tx, review_id)?;
        tx.commit()?;

        debug!(
            "Like {} on review {} by {}: changed={}, count={}",
            if liked { "set" } else { "cleared" },
            review_id,
            anonymous_id,
            changed,
            likes_count
        );
        Ok(LikeMutation {
            liked,
            changed,
            likes_count,
        })
    }

    /// Marks a review visible. Moderation happens out-of-band; this exists
    /// for operator tooling and test fixtures.
    pub fn set_review_approved(&self, review_id: &str, approved: bool) -> StoreResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE reviews SET approved = ?2 WHERE id = ?1",
            params![review_id, approved as i64],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("review {}", review_id)));
        }
        Ok(())
    }

    /// Writes a review row as-is, keeping its id, approval and timestamps.
    /// Used to import existing reviews. The imported `likes_count` has no
    /// like records behind it, so it is kept as the review's legacy base.
    pub fn insert_review(&self, review: &Review) -> StoreResult<()> {
        self.lock()?.execute(
            "INSERT INTO reviews (id, username, rating, text, service, approved, likes_count, created_at, image_url, photo_url, avatar_url, avatar, legacy_likes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?7)",
            params![
                review.id,
                review.username,
                review.rating,
                review.text,
                review.service,
                review.approved as i64,
                review.likes_count as i64,
                Self::format_datetime(&review.created_at),
                review.image_url,
                review.photo_url,
                review.avatar_url,
                review.avatar
            ],
        )?;
        Ok(())
    }

    pub fn put_settings(&self, settings: &SiteSettings) -> StoreResult<()> {
        let body = serde_json::to_string(settings)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        self.lock()?.execute(
            "INSERT OR REPLACE INTO config_documents (collection, document_id, body) VALUES (?1, ?2, ?3)",
            params![SETTINGS_COLLECTION, SETTINGS_DOCUMENT, body],
        )?;
        Ok(())
    }

    pub fn put_platform(&self, platform: &Platform) -> StoreResult<()> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO platforms (id, name, logo_url, whatsapp_url, sort_order, active) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                platform.id,
                platform.name,
                platform.logo_url,
                platform.whatsapp_url,
                platform.order,
                platform.active as i64
            ],
        )?;
        Ok(())
    }

    pub fn put_screen(&self, screen: &Screen) -> StoreResult<()> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO screens (id, image_url, sort_order, active) VALUES (?1, ?2, ?3, ?4)",
            params![screen.id, screen.image_url, screen.order, screen.active as i64],
        )?;
        Ok(())
    }
}

#[async_trait]
impl StorefrontStore for SqliteStorefrontStore {
    async fn fetch_approved_reviews(&self) -> StoreResult<Vec<Review>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM reviews WHERE approved = 1 ORDER BY created_at DESC, id DESC",
        )?;
        let reviews = stmt
            .query_map([], Self::row_to_review)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    async fn submit_review(&self, review: NewReview) -> StoreResult<Review> {
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
        self.lock()?.execute(
            "INSERT INTO reviews (id, username, rating, text, service, approved, likes_count, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6)",
            params![
                stored.id,
                stored.username,
                stored.rating,
                stored.text,
                stored.service,
                Self::format_datetime(&stored.created_at)
            ],
        )?;
        info!("Stored review {} pending approval", stored.id);
        Ok(stored)
    }

    async fn set_like(
        &self,
        review_id: &str,
        anonymous_id: &str,
        liked: bool,
    ) -> StoreResult<LikeMutation> {
        let mut conn = self.lock()?;
        self.apply_like(&mut conn, review_id, anonymous_id, liked)
    }

    async fn fetch_config(&self, kind: ConfigKind) -> StoreResult<ConfigPayload> {
        let conn = self.lock()?;
        match kind {
            ConfigKind::Settings => {
                let body: Option<String> = conn
                    .query_row(
                        "SELECT body FROM config_documents WHERE collection = ?1 AND document_id = ?2",
                        params![SETTINGS_COLLECTION, SETTINGS_DOCUMENT],
                        |row| row.get(0),
                    )
                    .optional()?;
                let settings = body
                    .map(|b| serde_json::from_str::<SiteSettings>(&b))
                    .transpose()
                    .map_err(|e| StoreError::InvalidData(format!("settings document: {}", e)))?;
                Ok(ConfigPayload::Settings(settings))
            }
            ConfigKind::Platforms => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM platforms WHERE active = 1 ORDER BY sort_order ASC, id ASC",
                )?;
                let platforms = stmt
                    .query_map([], Self::row_to_platform)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(ConfigPayload::Platforms(platforms))
            }
            ConfigKind::Screens => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM screens WHERE active = 1 ORDER BY sort_order ASC, id ASC",
                )?;
                let screens = stmt
                    .query_map([], Self::row_to_screen)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(ConfigPayload::Screens(screens))
            }
        }
    }

    async fn reconcile_like_counts(&self) -> StoreResult<usize> {
        if self.like_mode != LikeMode::Recorded {
            return Ok(0);
        }
        let conn = self.lock()?;
        let repaired = conn.execute(
            "UPDATE reviews SET likes_count = legacy_likes + (
                SELECT COUNT(*) FROM review_likes WHERE review_likes.review_id = reviews.id
            )
            WHERE likes_count != legacy_likes + (
                SELECT COUNT(*) FROM review_likes WHERE review_likes.review_id = reviews.id
            )",
            [],
        )?;
        if repaired > 0 {
            info!("Reconciled like counters on {} reviews", repaired);
        }
        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(username: &str, rating: u8) -> NewReview {
        NewReview {
            username: username.to_string(),
            rating,
            text: "works fine".to_string(),
            service: "Netflix".to_string(),
        }
    }

    async fn approved_review(store: &SqliteStorefrontStore, username: &str) -> Review {
        let review = store.submit_review(draft(username, 5)).await.unwrap();
        store.set_review_approved(&review.id, true).unwrap();
        review
    }

    #[tokio::test]
    async fn submitted_reviews_stay_hidden_until_approved() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        let review = store.submit_review(draft("ana", 4)).await.unwrap();
        assert!(!review.approved);
        assert_eq!(review.likes_count, 0);
        assert!(store.fetch_approved_reviews().await.unwrap().is_empty());

        store.set_review_approved(&review.id, true).unwrap();
        let approved = store.fetch_approved_reviews().await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, review.id);
        assert_eq!(approved[0].rating, Some(4));
        assert_eq!(approved[0].service.as_deref(), Some("Netflix"));
    }

    #[tokio::test]
    async fn approved_reviews_are_newest_first() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO reviews (id, username, rating, text, approved, created_at) VALUES
                 ('old', 'a', 5, 't', 1, '2024-01-01T00:00:00.000Z'),
                 ('new', 'b', 4, 't', 1, '2024-03-01T00:00:00.000Z'),
                 ('mid', 'c', 3, 't', 1, '2024-02-01T00:00:00.000Z'),
                 ('hidden', 'd', 1, 't', 0, '2024-04-01T00:00:00.000Z')",
                [],
            )
            .unwrap();
        }
        let ids: Vec<String> = store
            .fetch_approved_reviews()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn loosely_typed_ratings_are_tolerated() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO reviews (id, username, rating, text, approved) VALUES
                 ('a', 'a', NULL, 't', 1),
                 ('b', 'b', 'five', 't', 1),
                 ('c', 'c', '3', 't', 1)",
                [],
            )
            .unwrap();
        }
        let mut ratings: Vec<(String, Option<i64>)> = store
            .fetch_approved_reviews()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.rating))
            .collect();
        ratings.sort();
        assert_eq!(
            ratings,
            vec![
                ("a".to_string(), None),
                ("b".to_string(), None),
                ("c".to_string(), Some(3))
            ]
        );
    }

    #[tokio::test]
    async fn like_then_unlike_restores_state() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        let review = approved_review(&store, "ana").await;

        let liked = store.set_like(&review.id, "visitor-1", true).await.unwrap();
        assert_eq!(
            liked,
            LikeMutation {
                liked: true,
                changed: true,
                likes_count: 1
            }
        );

        let unliked = store.set_like(&review.id, "visitor-1", false).await.unwrap();
        assert_eq!(unliked.likes_count, 0);
        assert!(unliked.changed);

        let records: i64 = store
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM review_likes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(records, 0);
    }

    #[tokio::test]
    async fn repeated_like_is_idempotent_in_recorded_mode() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        let review = approved_review(&store, "ana").await;

        store.set_like(&review.id, "visitor-1", true).await.unwrap();
        let again = store.set_like(&review.id, "visitor-1", true).await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.likes_count, 1);

        let other = store.set_like(&review.id, "visitor-2", true).await.unwrap();
        assert_eq!(other.likes_count, 2);
    }

    #[tokio::test]
    async fn unlike_without_record_does_not_go_negative() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        let review = approved_review(&store, "ana").await;

        let result = store.set_like(&review.id, "visitor-1", false).await.unwrap();
        assert!(!result.changed);
        assert_eq!(result.likes_count, 0);
    }

    #[tokio::test]
    async fn counter_only_mode_rejects_unlike() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::CounterOnly).unwrap();
        let review = approved_review(&store, "ana").await;

        let liked = store.set_like(&review.id, "visitor-1", true).await.unwrap();
        assert_eq!(liked.likes_count, 1);

        let err = store
            .set_like(&review.id, "visitor-1", false)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied(_)));
        assert_eq!(store.reconcile_like_counts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn like_on_missing_review_is_not_found() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        let err = store.set_like("missing", "visitor-1", true).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let records: i64 = store
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM review_likes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(records, 0);
    }

    #[tokio::test]
    async fn reconcile_repairs_drifted_counters() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        let first = approved_review(&store, "ana").await;
        let second = approved_review(&store, "bob").await;
        store.set_like(&first.id, "v1", true).await.unwrap();
        store.set_like(&first.id, "v2", true).await.unwrap();
        store.set_like(&second.id, "v1", true).await.unwrap();

        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE reviews SET likes_count = 7 WHERE id = ?1",
                params![first.id],
            )
            .unwrap();

        assert_eq!(store.reconcile_like_counts().await.unwrap(), 1);
        let counts: Vec<(String, u64)> = store
            .fetch_approved_reviews()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.likes_count))
            .collect();
        assert!(counts.contains(&(first.id.clone(), 2)));
        assert!(counts.contains(&(second.id.clone(), 1)));
    }

    #[tokio::test]
    async fn missing_settings_document_is_none() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        assert_eq!(store.fetch_settings().await.unwrap(), None);

        let settings = SiteSettings {
            title: Some("My Shop".to_string()),
            rating_display: Some(4.5),
            ..Default::default()
        };
        store.put_settings(&settings).unwrap();
        assert_eq!(store.fetch_settings().await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn platforms_and_screens_are_active_and_ordered() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        for (id, order, active) in [("p2", 2, true), ("p1", 1, true), ("p0", 0, false)] {
            store
                .put_platform(&Platform {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    logo_url: format!("https://cdn.example/{}.png", id),
                    whatsapp_url: None,
                    order,
                    active,
                })
                .unwrap();
        }
        store
            .put_screen(&Screen {
                id: "s1".to_string(),
                image_url: "https://cdn.example/s1.png".to_string(),
                order: 1,
                active: true,
            })
            .unwrap();

        let ids: Vec<String> = store
            .fetch_platforms()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(store.fetch_screens().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reopening_existing_database_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storefront.db");
        let id = {
            let store = SqliteStorefrontStore::new(&path, LikeMode::Recorded).unwrap();
            approved_review(&store, "ana").await.id
        };

        let store = SqliteStorefrontStore::new(&path, LikeMode::Recorded).unwrap();
        let reviews = store.fetch_approved_reviews().await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].id, id);
    }

    #[tokio::test]
    async fn inserted_reviews_keep_their_fields() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        let created_at = DateTime::parse_from_rfc3339("2024-05-01T10:30:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        let review = Review {
            id: "imported".to_string(),
            username: "ana".to_string(),
            rating: Some(4),
            text: "fast activation".to_string(),
            service: Some("Netflix".to_string()),
            approved: true,
            likes_count: 7,
            created_at,
            image_url: None,
            photo_url: Some("https://cdn.example/ana.png".to_string()),
            avatar_url: None,
            avatar: None,
        };
        store.insert_review(&review).unwrap();

        let fetched = store.fetch_approved_reviews().await.unwrap();
        assert_eq!(fetched, vec![review.clone()]);
        assert!(store.insert_review(&review).is_err());
    }

    #[tokio::test]
    async fn reconcile_keeps_imported_likes() {
        let store = SqliteStorefrontStore::in_memory(LikeMode::Recorded).unwrap();
        let imported = Review {
            id: "imported".to_string(),
            username: "ana".to_string(),
            rating: Some(5),
            text: "great".to_string(),
            service: Some("Netflix".to_string()),
            approved: true,
            likes_count: 7,
            created_at: Utc::now(),
            image_url: None,
            photo_url: None,
            avatar_url: None,
            avatar: Some("https://cdn.example/ana.png".to_string()),
        };
        store.insert_review(&imported).unwrap();

        let liked = store.set_like("imported", "visitor-1", true).await.unwrap();
        assert_eq!(liked.likes_count, 8);

        assert_eq!(store.reconcile_like_counts().await.unwrap(), 0);
        let reviews = store.fetch_approved_reviews().await.unwrap();
        assert_eq!(reviews[0].likes_count, 8);
        assert_eq!(reviews[0].avatar, imported.avatar);

        store
            .lock()
            .unwrap()
            .execute("UPDATE reviews SET likes_count = 50 WHERE id = 'imported'", [])
            .unwrap();
        assert_eq!(store.reconcile_like_counts().await.unwrap(), 1);
        assert_eq!(
            store.fetch_approved_reviews().await.unwrap()[0].likes_count,
            8
        );

        let unliked = store.set_like("imported", "visitor-1", false).await.unwrap();
        assert_eq!(unliked.likes_count, 7);
        assert_eq!(store.reconcile_like_counts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn counter_only_likes_survive_switch_to_recorded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storefront.db");
        let id = {
            let store = SqliteStorefrontStore::new(&path, LikeMode::CounterOnly).unwrap();
            let review = approved_review(&store, "ana").await;
            store.set_like(&review.id, "v1", true).await.unwrap();
            store.set_like(&review.id, "v2", true).await.unwrap();
            review.id
        };

        let store = SqliteStorefrontStore::new(&path, LikeMode::Recorded).unwrap();
        assert_eq!(store.reconcile_like_counts().await.unwrap(), 0);
        assert_eq!(store.fetch_approved_reviews().await.unwrap()[0].likes_count, 2);
        let liked = store.set_like(&id, "v3", true).await.unwrap();
        assert_eq!(liked.likes_count, 3);
    }
}
