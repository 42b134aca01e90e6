//! Test fixture creation for the storefront database

use super::constants::*;
use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use std::path::PathBuf;
use storefront_server::storefront_store::{
    LikeMode, Platform, Review, Screen, SiteSettings, SqliteStorefrontStore,
};
use tempfile::TempDir;

fn review(id: &str, rating: i64, approved: bool, hours_ago: i64) -> Review {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Review {
        id: id.to_string(),
        username: format!("user-{}", id),
        rating: Some(rating),
        text: format!("Text of {}", id),
        service: Some("Netflix".to_string()),
        approved,
        likes_count: 0,
        created_at: base - Duration::hours(hours_ago),
        image_url: None,
        photo_url: None,
        avatar_url: None,
        avatar: None,
    }
}

/// Creates a temporary storefront database with six approved reviews, one
/// pending review, the settings document, three platforms and one screen.
/// Returns (temp_dir, db_path)
pub fn create_test_db(like_mode: LikeMode) -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("storefront.db");
    let store = SqliteStorefrontStore::new(&db_path, like_mode)?;

    for (hours_ago, (id, rating)) in APPROVED_REVIEWS.iter().enumerate() {
        let mut seeded = review(id, *rating, true, hours_ago as i64);
        if *id == REVIEW_2_ID {
            seeded.likes_count = REVIEW_2_LIKES;
        }
        store.insert_review(&seeded)?;
    }
    // Newer than every approved review, so it would sort first if leaked.
    store.insert_review(&review(PENDING_REVIEW_ID, 5, false, -1))?;

    store.put_settings(&SiteSettings {
        title: Some(SITE_TITLE.to_string()),
        whatsapp_default_url: Some(SITE_WHATSAPP_URL.to_string()),
        rating_display: Some(4.9),
        ..Default::default()
    })?;

    store.put_platform(&Platform {
        id: PLATFORM_2_ID.to_string(),
        name: "Disney+".to_string(),
        logo_url: "https://cdn.example/disney.png".to_string(),
        whatsapp_url: Some("https://wa.me/5215511111111".to_string()),
        order: 2,
        active: true,
    })?;
    store.put_platform(&Platform {
        id: PLATFORM_1_ID.to_string(),
        name: "Netflix".to_string(),
        logo_url: "https://cdn.example/netflix.png".to_string(),
        whatsapp_url: None,
        order: 1,
        active: true,
    })?;
    store.put_platform(&Platform {
        id: HIDDEN_PLATFORM_ID.to_string(),
        name: "Retired".to_string(),
        logo_url: "https://cdn.example/retired.png".to_string(),
        whatsapp_url: None,
        order: 0,
        active: false,
    })?;

    store.put_screen(&Screen {
        id: SCREEN_1_ID.to_string(),
        image_url: "https://cdn.example/screen-1.jpg".to_string(),
        order: 1,
        active: true,
    })?;

    Ok((dir, db_path))
}
