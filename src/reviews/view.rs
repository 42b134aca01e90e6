//! View model for the review list and the page header.

use crate::storefront_store::{Platform, Review, SiteSettings};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

pub const DEFAULT_TITLE: &str = "Invictus Streaming";
pub const DEFAULT_PLATFORMS_TITLE: &str = "Vuelve a entrar";
pub const DEFAULT_SCREENS_TITLE: &str = "Para ti";
pub const DEFAULT_RATING_DISPLAY: f64 = 4.8;
pub const DEFAULT_WHATSAPP_URL: &str = "https://wa.me/";
pub const DEFAULT_DISPLAY_NAME: &str = "Usuario";

pub const PREVIEW_LEN: usize = 4;
pub const EMPTY_STATE_MESSAGE: &str = "Aún no hay reseñas aprobadas.";

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

/// Site settings with every built-in default applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSettings {
    pub title: String,
    pub hero_image_url: Option<String>,
    pub platforms_title: String,
    pub screens_title: String,
    pub rating_display: f64,
    pub whatsapp_url: String,
    pub default_avatar_url: Option<String>,
    pub share_url: Option<String>,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self::resolve(None)
    }
}

impl ResolvedSettings {
    pub fn resolve(settings: Option<&SiteSettings>) -> Self {
        let empty = SiteSettings::default();
        let s = settings.unwrap_or(&empty);
        let owned = |v: Option<&String>| non_blank(v).map(str::to_string);

        Self {
            title: owned(s.title.as_ref()).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            hero_image_url: owned(s.hero_image_url.as_ref()),
            platforms_title: owned(s.platforms_title.as_ref())
                .unwrap_or_else(|| DEFAULT_PLATFORMS_TITLE.to_string()),
            screens_title: owned(s.screens_title.as_ref())
                .unwrap_or_else(|| DEFAULT_SCREENS_TITLE.to_string()),
            rating_display: s
                .rating_display
                .filter(|r| r.is_finite())
                .unwrap_or(DEFAULT_RATING_DISPLAY),
            // The default url field wins over the older one.
            whatsapp_url: owned(s.whatsapp_default_url.as_ref())
                .or_else(|| owned(s.whatsapp_url.as_ref()))
                .unwrap_or_else(|| DEFAULT_WHATSAPP_URL.to_string()),
            default_avatar_url: owned(s.default_avatar_url.as_ref()),
            share_url: owned(s.share_url.as_ref()),
        }
    }

    /// Rating shown in the header, one decimal.
    pub fn rating_display_text(&self) -> String {
        format!("{:.1}", self.rating_display)
    }

    /// Contact link for a platform, falling back to the site-wide one.
    pub fn platform_whatsapp_url(&self, platform: &Platform) -> String {
        non_blank(platform.whatsapp_url.as_ref())
            .map(str::to_string)
            .unwrap_or_else(|| self.whatsapp_url.clone())
    }
}

/// Filled and empty stars for a rating. Missing or out-of-range ratings are
/// clamped into 1..=5.
pub fn stars_text(rating: Option<i64>) -> String {
    let n = rating.unwrap_or(1).clamp(1, 5) as usize;
    format!("{}{}", "★".repeat(n), "☆".repeat(5 - n))
}

/// "Hoy", "Ayer" or `dd/mm/yy`, by calendar day in the visitor's time zone.
/// `now` carries the visitor's UTC offset.
pub fn day_label(created_at: DateTime<Utc>, now: DateTime<FixedOffset>) -> String {
    let day = created_at.with_timezone(now.offset()).date_naive();
    match (now.date_naive() - day).num_days() {
        0 => "Hoy".to_string(),
        1 => "Ayer".to_string(),
        _ => day.format("%d/%m/%y").to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewCard {
    pub id: String,
    pub stars: String,
    pub display_name: String,
    pub day_label: String,
    pub service: String,
    pub text: String,
    pub avatar_url: Option<String>,
    pub liked: bool,
    pub likes_count: u64,
}

impl ReviewCard {
    pub fn build(
        review: &Review,
        settings: &ResolvedSettings,
        liked: bool,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let avatar_url = non_blank(review.image_url.as_ref())
            .or_else(|| non_blank(review.photo_url.as_ref()))
            .or_else(|| non_blank(review.avatar_url.as_ref()))
            .or_else(|| non_blank(review.avatar.as_ref()))
            .map(str::to_string)
            .or_else(|| settings.default_avatar_url.clone());

        Self {
            id: review.id.clone(),
            stars: stars_text(review.rating),
            display_name: non_blank(Some(&review.username))
                .unwrap_or(DEFAULT_DISPLAY_NAME)
                .to_string(),
            day_label: day_label(review.created_at, now),
            // Not the configured title: reviews without a service predate it.
            service: non_blank(review.service.as_ref())
                .unwrap_or(DEFAULT_TITLE)
                .to_string(),
            text: review.text.clone(),
            avatar_url,
            liked,
            likes_count: review.likes_count,
        }
    }
}

/// The cards shown on the home section before the full list is opened.
pub fn preview(cards: &[ReviewCard]) -> &[ReviewCard] {
    &cards[..cards.len().min(PREVIEW_LEN)]
}
