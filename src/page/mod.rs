//! Everything the storefront page renders, loaded in one go.

use crate::engagement::LocalLikeMarks;
use crate::reviews::view::{self, EMPTY_STATE_MESSAGE};
use crate::reviews::{ResolvedSettings, ReviewCard, ReviewSummary};
use crate::storefront_store::{Platform, Screen, StoreResult, StorefrontStore};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformLink {
    pub id: String,
    pub name: String,
    pub logo_url: String,
    pub whatsapp_url: String,
}

/// Page data with defaults applied. Sections whose read failed are listed in
/// `degraded` and rendered empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageState {
    pub settings: ResolvedSettings,
    pub platforms: Vec<PlatformLink>,
    pub screens: Vec<Screen>,
    pub reviews: Vec<ReviewCard>,
    pub summary: ReviewSummary,
    pub empty_state: Option<&'static str>,
    pub degraded: Vec<&'static str>,
}

fn or_default<T: Default>(
    section: &'static str,
    result: StoreResult<T>,
    degraded: &mut Vec<&'static str>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!("Failed to load {}: {}", section, err);
            degraded.push(section);
            T::default()
        }
    }
}

impl PageState {
    /// Runs the four reads concurrently. Never fails: a failed read falls
    /// back to empty data.
    pub async fn load(
        store: &dyn StorefrontStore,
        marks: Option<&LocalLikeMarks>,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let (settings, platforms, screens, reviews) = tokio::join!(
            store.fetch_settings(),
            store.fetch_platforms(),
            store.fetch_screens(),
            store.fetch_approved_reviews(),
        );

        let mut degraded = Vec::new();
        let settings = or_default("settings", settings, &mut degraded);
        let platforms: Vec<Platform> = or_default("platforms", platforms, &mut degraded);
        let screens = or_default("screens", screens, &mut degraded);
        let reviews = or_default("reviews", reviews, &mut degraded);

        let settings = ResolvedSettings::resolve(settings.as_ref());
        let summary = ReviewSummary::from_reviews(&reviews);
        let platforms = platforms
            .iter()
            .map(|p| PlatformLink {
                id: p.id.clone(),
                name: p.name.clone(),
                logo_url: p.logo_url.clone(),
                whatsapp_url: settings.platform_whatsapp_url(p),
            })
            .collect();
        let cards: Vec<ReviewCard> = reviews
            .iter()
            .map(|r| {
                let liked = marks.map(|m| m.is_liked(&r.id)).unwrap_or(false);
                ReviewCard::build(r, &settings, liked, now)
            })
            .collect();

        Self {
            settings,
            platforms,
            screens,
            empty_state: cards.is_empty().then_some(EMPTY_STATE_MESSAGE),
            reviews: cards,
            summary,
            degraded,
        }
    }

    pub fn preview(&self) -> &[ReviewCard] {
        view::preview(&self.reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::MemoryLocalStorage;
    use crate::storefront_store::{
        LikeMode, MemoryStorefrontStore, Review, SiteSettings, StoreError,
    };
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn today() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap().fixed_offset()
    }

    fn seeded_store() -> MemoryStorefrontStore {
        let store = MemoryStorefrontStore::new(LikeMode::Recorded);
        store.set_settings(Some(SiteSettings {
            title: Some("Tienda".into()),
            ..Default::default()
        }));
        store.push_platform(Platform {
            id: "b".into(),
            name: "B".into(),
            logo_url: "b.png".into(),
            whatsapp_url: None,
            order: 2,
            active: true,
        });
        store.push_platform(Platform {
            id: "a".into(),
            name: "A".into(),
            logo_url: "a.png".into(),
            whatsapp_url: Some("https://wa.me/a".into()),
            order: 1,
            active: true,
        });
        for (i, rating) in [5, 4, 5, 3, 5].iter().enumerate() {
            store.insert_review(Review {
                id: format!("r{}", i),
                username: format!("user{}", i),
                rating: Some(*rating),
                text: "ok".into(),
                service: None,
                approved: true,
                likes_count: i as u64,
                created_at: Utc.with_ymd_and_hms(2024, 5, 1, i as u32, 0, 0).unwrap(),
                image_url: None,
                photo_url: None,
                avatar_url: None,
                avatar: None,
            });
        }
        store
    }

    #[tokio::test]
    async fn loads_every_section() {
        let store = seeded_store();
        let marks = LocalLikeMarks::new(Arc::new(MemoryLocalStorage::new()));
        marks.set_liked("r4", true).unwrap();

        let page = PageState::load(&store, Some(&marks), today()).await;

        assert!(page.degraded.is_empty());
        assert_eq!(page.settings.title, "Tienda");
        let ids: Vec<&str> = page.platforms.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(page.platforms[1].whatsapp_url, "https://wa.me/");
        assert_eq!(page.summary.approved_count, 5);
        assert_eq!(page.reviews[0].id, "r4");
        assert!(page.reviews[0].liked);
        assert_eq!(page.reviews[0].day_label, "Ayer");
        assert_eq!(page.preview().len(), 4);
        assert_eq!(page.empty_state, None);
    }

    #[tokio::test]
    async fn day_labels_use_the_given_offset() {
        let store = seeded_store();
        // r4 was written at 04:00 UTC on May 1st, 22:00 on April 30th in UTC-6.
        let morning_utc = Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap();

        let page = PageState::load(&store, None, morning_utc.fixed_offset()).await;
        assert_eq!(page.reviews[0].day_label, "Hoy");

        let utc_minus_6 = FixedOffset::west_opt(6 * 3600).unwrap();
        let page = PageState::load(&store, None, morning_utc.with_timezone(&utc_minus_6)).await;
        assert_eq!(page.reviews[0].day_label, "Ayer");
    }

    #[tokio::test]
    async fn failed_reads_degrade_to_defaults() {
        let store = seeded_store();
        store.fail_next_read(StoreError::Unavailable("offline".into()));
        store.fail_next_read(StoreError::Unavailable("offline".into()));
        store.fail_next_read(StoreError::Unavailable("offline".into()));
        store.fail_next_read(StoreError::Unavailable("offline".into()));

        let page = PageState::load(&store, None, today()).await;

        assert_eq!(page.degraded.len(), 4);
        assert_eq!(page.settings, ResolvedSettings::default());
        assert!(page.platforms.is_empty());
        assert!(page.reviews.is_empty());
        assert_eq!(page.empty_state, Some(EMPTY_STATE_MESSAGE));
    }

    #[tokio::test]
    async fn missing_settings_document_is_not_a_failure() {
        let store = MemoryStorefrontStore::default();
        let page = PageState::load(&store, None, today()).await;

        assert!(page.degraded.is_empty());
        assert_eq!(page.settings.title, view::DEFAULT_TITLE);
        assert!(page.summary.is_empty());
    }
}
